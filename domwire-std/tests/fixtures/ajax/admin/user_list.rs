// Discovery fixture: the file name is what matters, not its content.
pub struct UserList;
