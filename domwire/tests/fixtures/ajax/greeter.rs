//! Found by scanning `tests/fixtures/ajax`.

use domwire::prelude::*;

#[derive(Default)]
pub struct Greeter {
    ctx: Context,
}

#[callable(context = ctx)]
impl Greeter {
    pub fn greet(&mut self, name: String) {
        self.node("greeting").html(format!("Hi {name}"));
    }
}
