pub mod alert;
pub mod badge;
pub mod button;
pub mod card;
pub mod empty_state;
pub mod input;
pub mod label;
pub mod property_row;
pub mod spinner;

pub use alert::*;
pub use badge::*;
pub use button::*;
pub use card::*;
pub use empty_state::*;
pub use input::*;
pub use label::*;
pub use property_row::*;
pub use spinner::*;
