// src/modules/mod.rs
//
// Suppression modules available to a frame processor.

mod identity;
#[cfg(feature = "rnnoise")]
mod rnnoise;

pub use identity::IdentityModule;
#[cfg(feature = "rnnoise")]
pub use rnnoise::RnnoiseModule;

use crate::engine::SuppressionModule;

/// Linear memory per module, in frames. The processor needs two.
pub const ARENA_FRAMES: usize = 4;

/// Create the default suppression module.
///
/// RNNoise when the `rnnoise` feature is enabled, otherwise an identity
/// module with the same frame size.
pub fn create_default_module() -> Box<dyn SuppressionModule> {
    #[cfg(feature = "rnnoise")]
    {
        Box::new(RnnoiseModule::new())
    }
    #[cfg(not(feature = "rnnoise"))]
    {
        Box::new(IdentityModule::new(crate::config::DEFAULT_FRAME_SIZE))
    }
}
