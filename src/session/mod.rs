pub mod feedback;
pub mod session;

pub use feedback::{Feedback, Tone};
pub use session::PostureSession;
