//! Found by scanning `tests/fixtures/ajax` as `Admin::UserList`.

use domwire::prelude::*;

#[derive(Default)]
pub struct UserList {
    ctx: Context,
}

#[callable(context = ctx)]
impl UserList {
    /// Count visits in the `users` data bag.
    pub fn count(&mut self) {
        let users = self.bag("users");
        let seen = users.get("seen").and_then(|v| v.as_i64()).unwrap_or(0) + 1;
        users.set("seen", seen);
        self.response().html("count", seen);
    }
}
