mod category;
mod employee;
mod leave_request;
mod leave_type;
mod validation;

pub use category::*;
pub use employee::*;
pub use leave_request::*;
pub use leave_type::*;
pub use validation::*;
