//! A small blog domain shared by the integration tests.

use sqlmap::core::reflect::ClassDef;

pub fn author() -> ClassDef {
    ClassDef::new("Author")
        .getter("getId", "i32")
        .setter("setId", "i32")
        .getter("getUsername", "string")
        .setter("setUsername", "string")
        .getter("getEmail", "string")
        .setter("setEmail", "string")
}

pub fn post() -> ClassDef {
    ClassDef::new("Post")
        .getter("getId", "i32")
        .setter("setId", "i32")
        .getter("getSubject", "string")
        .setter("setSubject", "string")
        .getter("getAuthor", "Author")
        .setter("setAuthor", "Author")
}

pub fn blog() -> ClassDef {
    ClassDef::new("Blog")
        .getter("getId", "i32")
        .setter("setId", "i32")
        .getter("getTitle", "string")
        .setter("setTitle", "string")
        .getter("getAuthor", "Author")
        .setter("setAuthor", "Author")
        .getter("getPosts", "list")
        .setter("setPosts", "list")
}

/// Every class above, registered.
pub fn builder() -> sqlmap::Builder {
    classes!(author(), post(), blog())
}
