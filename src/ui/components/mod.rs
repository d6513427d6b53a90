mod command_input;
mod confirm;
mod form;
mod input;
mod key_result;
mod picker;

pub use command_input::{CommandEvent, CommandInput};
pub use confirm::{ConfirmDialog, ConfirmEvent};
pub use form::{FormEvent, FormField, FormModal, FormValues};
pub use key_result::KeyResult;
pub use picker::{Picker, PickerEvent};
