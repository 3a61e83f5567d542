use std::sync::Arc;

use async_trait::async_trait;
use proptest::prelude::*;
use serde_json::{json, Value};

use crate::errors::TransportError;
use crate::session::Session;
use crate::transport::{ApiClient, Method, Transport};
use crate::types::{AccountPageQuery, User};

struct Fixed(Value);

#[async_trait]
impl Transport for Fixed {
    async fn send(&self, _: Method, _: &str, _: Option<Value>) -> Result<Value, TransportError> {
        Ok(self.0.clone())
    }
}

fn session() -> Arc<Session> {
    let session = Arc::new(Session::new());
    session.begin(User {
        uid: "u".into(),
        username: "alice".into(),
        rsa_public_key: String::new(),
        role: "user".into(),
        create_time: String::new(),
    });
    session
}

proptest! {
    #[test]
    fn non_success_codes_surface_as_api_errors(
        code in any::<i64>().prop_filter("success code", |c| *c != 0),
        msg in ".{0,40}",
    ) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let client = ApiClient::new(Fixed(json!({ "code": code, "msg": msg, "data": 1 })), session());

        let result = runtime.block_on(client.request::<Value, Value>(Method::Get, "any", None));
        prop_assert_eq!(result, Err(TransportError::Api { code, msg }));
        prop_assert!(client.session().is_active());
    }

    #[test]
    fn page_query_never_sends_nulls(
        page_num in proptest::option::of(1u32..1000),
        website in proptest::option::of("[a-z]{1,12}"),
        notes in proptest::option::of(".{0,20}"),
    ) {
        let query = AccountPageQuery { page_num, website, notes, ..Default::default() };
        let value = serde_json::to_value(&query).unwrap();
        let object = value.as_object().unwrap();

        prop_assert!(object.values().all(|v| !v.is_null()));
        prop_assert_eq!(object.contains_key("pageNum"), query.page_num.is_some());
    }
}
