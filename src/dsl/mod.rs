pub mod model;
pub mod validator;
