//! Concrete user API requests

use serde_json::Value;

use super::ApiRequest;
use crate::domain::{User, UserCreationParams, UserPage, UserUpdateParams};
use crate::transport::Method;

fn to_body<T: serde::Serialize>(params: &T) -> Option<Value> {
    serde_json::to_value(params).ok()
}

/// POST /users
#[derive(Debug, Clone)]
pub struct CreateUserRequest {
    pub params: UserCreationParams,
}

impl ApiRequest for CreateUserRequest {
    type Response = User;

    fn method(&self) -> Method {
        Method::Post
    }

    fn path(&self) -> Vec<String> {
        vec!["users".to_string()]
    }

    fn body(&self) -> Option<Value> {
        to_body(&self.params)
    }
}

/// PUT /users/{user_id}
#[derive(Debug, Clone)]
pub struct UpdateUserRequest {
    pub params: UserUpdateParams,
}

impl ApiRequest for UpdateUserRequest {
    type Response = User;

    fn method(&self) -> Method {
        Method::Put
    }

    fn path(&self) -> Vec<String> {
        vec!["users".to_string(), self.params.user_id.clone()]
    }

    fn body(&self) -> Option<Value> {
        to_body(&self.params)
    }
}

/// GET /users/{user_id}
#[derive(Debug, Clone)]
pub struct GetUserRequest {
    pub user_id: String,
}

impl ApiRequest for GetUserRequest {
    type Response = User;

    fn method(&self) -> Method {
        Method::Get
    }

    fn path(&self) -> Vec<String> {
        vec!["users".to_string(), self.user_id.clone()]
    }
}

/// GET /users?nickname=..&limit=..&token=..
#[derive(Debug, Clone)]
pub struct ListUsersRequest {
    pub nickname: String,
    pub limit: usize,
    pub token: Option<String>,
}

impl ApiRequest for ListUsersRequest {
    type Response = UserPage;

    fn method(&self) -> Method {
        Method::Get
    }

    fn path(&self) -> Vec<String> {
        vec!["users".to_string()]
    }

    fn query(&self) -> Vec<(String, String)> {
        let mut query = vec![
            ("nickname".to_string(), self.nickname.clone()),
            ("limit".to_string(), self.limit.to_string()),
        ];
        if let Some(token) = self.token.as_ref().filter(|t| !t.is_empty()) {
            query.push(("token".to_string(), token.clone()));
        }
        query
    }
}
