use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Assigned by the backend; absent on records that have not been created yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub name: String,
    pub img: String,
    pub text: String,
    /// Display label only, never parsed as a timestamp.
    pub time: String,
}

impl Post {
    pub fn draft(
        name: impl Into<String>,
        img: impl Into<String>,
        text: impl Into<String>,
        time: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            img: img.into(),
            text: text.into(),
            time: time.into(),
        }
    }

    pub fn without_id(&self) -> Self {
        Self {
            id: None,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_serializes_without_id() {
        let post = Post::draft("alice", "/a.png", "hello", "5 min ago");
        let json = serde_json::to_value(&post).unwrap();
        assert!(json.get("id").is_none());
        assert_eq!(json["name"], "alice");
        assert_eq!(json["time"], "5 min ago");
    }

    #[test]
    fn backend_record_keeps_id() {
        let post: Post = serde_json::from_str(
            r#"{"id":7,"name":"bob","img":"/b.png","text":"hi","time":"now"}"#,
        )
        .unwrap();
        assert_eq!(post.id, Some(7));
        assert_eq!(post.without_id().id, None);
        assert_eq!(post.without_id().name, "bob");
    }
}
