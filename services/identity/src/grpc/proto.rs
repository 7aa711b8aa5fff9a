//! Wire messages for `identity.v1.User`.

use crate::model::User;

/// `GetUserByID` request.
#[derive(Clone, Copy, PartialEq, Eq, ::prost::Message)]
pub struct UserRequest {
    /// User id
    #[prost(int64, tag = "1")]
    pub id: i64,
}

/// `GetUserByID` response.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct UserResponse {
    /// User id
    #[prost(int64, tag = "1")]
    pub id: i64,
    /// Display name
    #[prost(string, tag = "2")]
    pub name: ::prost::alloc::string::String,
    /// Email
    #[prost(string, tag = "3")]
    pub email: ::prost::alloc::string::String,
    /// Age in years
    #[prost(int32, tag = "4")]
    pub age: i32,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            age: user.age,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn test_response_field_tags() {
        let msg = UserResponse {
            id: 1,
            name: "A".into(),
            email: "a@x.com".into(),
            age: 2,
        };
        let bytes = msg.encode_to_vec();

        // field 1, varint
        assert_eq!(bytes[0], 0x08);
        assert_eq!(UserResponse::decode(bytes.as_slice()).unwrap(), msg);
    }
}
