//! Fixed response messages and the permission each endpoint requires.

pub const UNAUTHORIZED: &str = "Unauthorized";
pub const USERNAME_PASSWORD_REQUIRED: &str = "Username and password are required";
pub const USER_ALREADY_EXISTS: &str = "User with this username or email already exists";
pub const USER_NOT_FOUND: &str = "User not found.";
pub const INTERNAL_ERROR: &str = "Internal server error";

/// A scope the caller's token must carry, paired with the protected resource
/// the authorization service issues a ticket for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permission {
    pub scope: &'static str,
    pub resource_id: &'static str,
}

pub const ADD_USER: Permission = Permission {
    scope: "add-user",
    resource_id: "addUser",
};

pub const GET_USERS: Permission = Permission {
    scope: "get-users",
    resource_id: "getUsers",
};

/// Upper bound for `max` on `/getUsers`. Without `max` every match is returned.
pub const MAX_PAGE_SIZE: i64 = 1000;
