//! Camera frames, sampling and the vision-model seams.
//!
//! The camera and the vision models are external collaborators; the engine
//! only talks to them through the traits defined here.

mod recognizer;
mod sampler;
mod source;

pub use recognizer::{Category, GestureClassifier, LandmarkExtractor, categories_to_candidates};
pub use sampler::FrameSampler;
pub use source::{CameraSource, Frame, FrameRenderer, NullRenderer};
