pub use constants::{CLOCK_SPEED, DISPLAY_HEIGHT, DISPLAY_WIDTH, KEY_COUNT};
pub use error::{LoadError, StepError};
pub use instruction::Instruction;
pub use machine::{Machine, StepOutcome};
pub use opcode::Opcode;
pub use state::{FrameBuffer, State};

pub mod constants;
mod error;
mod instruction;
mod loader;
mod machine;
mod opcode;
mod operations;
mod state;
