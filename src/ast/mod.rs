pub mod conditions;
pub mod fields;
pub mod operators;
pub mod values;

pub use self::conditions::Condition;
pub use self::fields::FieldMap;
pub use self::operators::Operator;
pub use self::values::{Param, Value};
