use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One feedback thread on a model/dataset pair. Replies are exclusively
/// owned: they are exported inline and cease to exist without their parent.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    #[serde(default)]
    pub id: i64,
    pub model_id: i64,
    pub dataset_id: i64,
    pub user_login: String,
    pub feedback_type: String,
    #[serde(default)]
    pub feature_name: Option<String>,
    pub feedback_message: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub replies: Vec<FeedbackReply>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackReply {
    #[serde(default)]
    pub id: i64,
    /// Reply this reply answers, within the same thread; earlier in list
    /// order than the replying entry
    #[serde(default)]
    pub reply_to_reply: Option<i64>,
    pub user_login: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
