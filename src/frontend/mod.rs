pub mod css;
pub mod responder;

pub use self::responder::TemplateToResponse;
