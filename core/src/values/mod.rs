//! Runtime value model.
//!
//! Values form a closed enum. Fields are resolved through a single entry
//! point, [`resolve_field`], which covers struct dispatch, built-in
//! methods, library symbols and the universal `str`, `==` and `!=`.

mod fields;
mod function;
mod library;
mod methods;
mod value;


pub use fields::{equals, is_identifier_shaped, resolve_field, static_convention, stringify};
pub use function::{
    BoundMethod, Closure, Convention, Function, Kind, NativeFn, NativeFunction, Signature,
};
pub use library::Library;
pub use value::{Definition, Value};
