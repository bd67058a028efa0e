#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use qa_forum::{app::build_app, state::AppState};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

pub const PASSWORD: &str = "correct-horse";

/// A registered, logged-in account.
pub struct Actor {
    pub id: Uuid,
    pub token: String,
}

pub struct TestApp {
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self {
            router: build_app(AppState::fake()),
        }
    }

    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(body) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };

        let res = self.router.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send("GET", uri, token, None).await
    }

    pub async fn register(&self, name: &str, email: &str, role: Option<&str>) -> (StatusCode, Value) {
        let mut body = json!({
            "name": name,
            "email": email,
            "password": PASSWORD,
            "confirmPassword": PASSWORD,
        });
        if let Some(role) = role {
            body["role"] = json!(role);
        }
        self.send("POST", "/api/auth/register", None, Some(body)).await
    }

    pub async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.send(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await
    }

    async fn actor(&self, name: &str, role: Option<&str>) -> Actor {
        let email = format!("{}-{}@example.com", name.to_lowercase(), Uuid::new_v4());
        let (status, _) = self.register(name, &email, role).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, body) = self.login(&email, PASSWORD).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        Actor {
            id: body["user"]["userId"].as_str().unwrap().parse().unwrap(),
            token: body["token"].as_str().unwrap().to_string(),
        }
    }

    pub async fn user(&self, name: &str) -> Actor {
        self.actor(name, None).await
    }

    pub async fn admin(&self, name: &str) -> Actor {
        self.actor(name, Some("admin")).await
    }

    /// Posts a question and returns its id.
    pub async fn ask(&self, who: &Actor, text: &str, tag: &str) -> Uuid {
        let (status, body) = self
            .send(
                "POST",
                "/api/questions",
                Some(&who.token),
                Some(json!({ "Question": text, "tag": tag })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"]["id"].as_str().unwrap().parse().unwrap()
    }

    pub async fn approve(&self, admin: &Actor, id: Uuid) {
        let (status, body) = self
            .send(
                "PATCH",
                &format!("/api/questions/approve/{id}"),
                Some(&admin.token),
                Some(json!({ "isApproved": true })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
    }

    /// Posts a comment and returns its id.
    pub async fn comment(&self, who: &Actor, question_id: Uuid, content: &str) -> Uuid {
        let (status, body) = self
            .send(
                "POST",
                "/api/questions/createComment",
                Some(&who.token),
                Some(json!({ "questionId": question_id, "content": content })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["comment"]["id"].as_str().unwrap().parse().unwrap()
    }
}

pub fn ids(list: &Value) -> Vec<String> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|q| q["id"].as_str().unwrap().to_string())
        .collect()
}
