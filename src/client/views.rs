//! Client-side view state: feed, own pending questions, admin dashboard and
//! comment threads. Every method takes the caller's [`Session`] explicitly.

use time::OffsetDateTime;
use tracing::{debug, warn};
use uuid::Uuid;

use super::api::{ClientError, ForumApi};
use super::optimistic::OptimisticList;
use super::session::Session;
use crate::comments::{dto::CommentView, repo_types::Comment};
use crate::questions::{dto::QuestionView, repo_types::Question};
use crate::shared::AuthorSummary;

fn not_allowed(msg: &str) -> ClientError {
    ClientError::NotAllowed(msg.to_string())
}

/// Replaces the cached question with the server's copy, keeping the
/// expanded author.
fn confirm_question(list: &mut OptimisticList<QuestionView>, saved: Question) {
    let author = list.get(saved.id).and_then(|q| q.author.clone());
    list.confirm(QuestionView {
        question: saved,
        author,
    });
}

fn confirm_comment(list: &mut OptimisticList<CommentView>, local_id: Uuid, saved: Comment) {
    let author = list.get(local_id).and_then(|c| c.author.clone());
    list.confirm_replace(
        local_id,
        CommentView {
            comment: saved,
            author,
        },
    );
}

#[derive(Debug, Default)]
pub struct FeedView {
    questions: OptimisticList<QuestionView>,
}

impl FeedView {
    pub async fn load(&mut self, api: &dyn ForumApi) -> Result<(), ClientError> {
        let questions = api.approved_questions().await?;
        debug!(count = questions.len(), "feed loaded");
        self.questions.replace_all(questions);
        Ok(())
    }

    pub fn questions(&self) -> &[QuestionView] {
        self.questions.items()
    }

    /// Edit and delete are offered on the feed only to the owner.
    pub fn can_modify(session: &Session, q: &QuestionView) -> bool {
        session.owns(q.question.user_id)
    }

    fn check_owner(&self, session: &Session, id: Uuid) -> Result<(), ClientError> {
        match self.questions.get(id) {
            None => Err(not_allowed("No such question in the feed")),
            Some(q) if !Self::can_modify(session, q) => {
                Err(not_allowed("You can only change your own questions"))
            }
            Some(_) => Ok(()),
        }
    }

    pub async fn edit(
        &mut self,
        api: &dyn ForumApi,
        session: &Session,
        id: Uuid,
        text: &str,
    ) -> Result<(), ClientError> {
        self.check_owner(session, id)?;
        let snap = self
            .questions
            .modify(id, |q| q.question.question = text.to_string())
            .ok_or_else(|| not_allowed("No such question in the feed"))?;
        match api.update_question(&session.token, id, text).await {
            Ok(saved) => {
                confirm_question(&mut self.questions, saved);
                Ok(())
            }
            Err(e) => {
                warn!(%id, error = %e, "question edit rolled back");
                self.questions.rollback(snap);
                Err(e)
            }
        }
    }

    pub async fn delete(
        &mut self,
        api: &dyn ForumApi,
        session: &Session,
        id: Uuid,
    ) -> Result<String, ClientError> {
        self.check_owner(session, id)?;
        let snap = self
            .questions
            .remove(id)
            .ok_or_else(|| not_allowed("No such question in the feed"))?;
        api.delete_question(&session.token, id).await.map_err(|e| {
            warn!(%id, error = %e, "question delete rolled back");
            self.questions.rollback(snap);
            e
        })
    }
}

/// The session user's questions awaiting approval. Fetched on first use
/// and cached afterwards.
#[derive(Debug, Default)]
pub struct PendingView {
    questions: OptimisticList<QuestionView>,
    loaded: bool,
}

impl PendingView {
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn questions(&self) -> &[QuestionView] {
        self.questions.items()
    }

    /// Returns whether a request was made. A 404 is an empty list.
    pub async fn ensure_loaded(
        &mut self,
        api: &dyn ForumApi,
        session: &Session,
    ) -> Result<bool, ClientError> {
        if self.loaded {
            return Ok(false);
        }
        let questions = match api
            .user_pending_questions(&session.token, session.user_id)
            .await
        {
            Ok(questions) => questions,
            Err(e) if e.is_not_found() => Vec::new(),
            Err(e) => return Err(e),
        };
        self.questions.replace_all(questions);
        self.loaded = true;
        Ok(true)
    }

    /// Adds a just-submitted question to the cache once it exists.
    pub fn record_submitted(&mut self, question: Question) {
        if self.loaded {
            let _ = self.questions.insert_front(question.into());
        }
    }
}

#[derive(Debug, Default)]
pub struct AdminDashboard {
    approved: OptimisticList<QuestionView>,
    pending: OptimisticList<QuestionView>,
}

impl AdminDashboard {
    pub async fn load(api: &dyn ForumApi, session: &Session) -> Result<Self, ClientError> {
        if !session.is_admin() {
            return Err(not_allowed("Admin access required"));
        }
        let approved = api.approved_questions().await?;
        let pending = match api.pending_questions(&session.token).await {
            Ok(questions) => questions,
            Err(e) if e.is_not_found() => Vec::new(),
            Err(e) => return Err(e),
        };
        Ok(Self {
            approved: OptimisticList::new(approved),
            pending: OptimisticList::new(pending),
        })
    }

    pub fn approved(&self) -> &[QuestionView] {
        self.approved.items()
    }

    pub fn pending(&self) -> &[QuestionView] {
        self.pending.items()
    }

    /// Deletes any approved post, regardless of owner.
    pub async fn delete_post(
        &mut self,
        api: &dyn ForumApi,
        session: &Session,
        id: Uuid,
    ) -> Result<String, ClientError> {
        let snap = self
            .approved
            .remove(id)
            .ok_or_else(|| not_allowed("No such post"))?;
        api.delete_question(&session.token, id).await.map_err(|e| {
            self.approved.rollback(snap);
            e
        })
    }

    /// Approves or rejects a pending question and drops it from the
    /// pending list. Approved ones move to the top of the approved list.
    pub async fn decide(
        &mut self,
        api: &dyn ForumApi,
        session: &Session,
        id: Uuid,
        approve: bool,
    ) -> Result<Question, ClientError> {
        let author = self
            .pending
            .get(id)
            .ok_or_else(|| not_allowed("No such pending question"))?
            .author
            .clone();
        let snap = self
            .pending
            .remove(id)
            .ok_or_else(|| not_allowed("No such pending question"))?;
        match api.approve_question(&session.token, id, approve).await {
            Ok(saved) => {
                if saved.is_approved {
                    let _ = self.approved.insert_front(QuestionView {
                        question: saved.clone(),
                        author,
                    });
                }
                Ok(saved)
            }
            Err(e) => {
                self.pending.rollback(snap);
                Err(e)
            }
        }
    }
}

#[derive(Debug)]
pub struct CommentThread {
    question_id: Uuid,
    comments: OptimisticList<CommentView>,
}

impl CommentThread {
    pub async fn open(api: &dyn ForumApi, question_id: Uuid) -> Result<Self, ClientError> {
        let comments = api.comments(question_id).await?;
        Ok(Self {
            question_id,
            comments: OptimisticList::new(comments),
        })
    }

    pub fn question_id(&self) -> Uuid {
        self.question_id
    }

    pub fn comments(&self) -> &[CommentView] {
        self.comments.items()
    }

    pub fn can_edit(session: &Session, c: &CommentView) -> bool {
        session.owns(c.comment.user_id)
    }

    pub fn can_delete(session: &Session, c: &CommentView) -> bool {
        Self::can_edit(session, c) || session.is_admin()
    }

    /// Shows the comment at the head right away under a local id, then
    /// swaps in the stored one.
    pub async fn add(
        &mut self,
        api: &dyn ForumApi,
        session: &Session,
        content: &str,
    ) -> Result<(), ClientError> {
        let now = OffsetDateTime::now_utc();
        let local_id = Uuid::new_v4();
        let snap = self.comments.insert_front(CommentView {
            comment: Comment {
                id: local_id,
                user_id: session.user_id,
                question_id: self.question_id,
                content: content.to_string(),
                likes: Vec::new(),
                created_at: now,
                updated_at: now,
            },
            author: Some(AuthorSummary {
                id: session.user_id,
                name: session.name.clone(),
                email: session.email.clone(),
            }),
        });
        match api
            .create_comment(&session.token, self.question_id, content)
            .await
        {
            Ok(saved) => {
                confirm_comment(&mut self.comments, local_id, saved);
                Ok(())
            }
            Err(e) => {
                self.comments.rollback(snap);
                Err(e)
            }
        }
    }

    pub async fn edit(
        &mut self,
        api: &dyn ForumApi,
        session: &Session,
        id: Uuid,
        content: &str,
    ) -> Result<(), ClientError> {
        match self.comments.get(id) {
            None => return Err(not_allowed("No such comment")),
            Some(c) if !Self::can_edit(session, c) => {
                return Err(not_allowed("You can only edit your own comments"))
            }
            Some(_) => {}
        }
        let snap = self
            .comments
            .modify(id, |c| c.comment.content = content.to_string())
            .ok_or_else(|| not_allowed("No such comment"))?;
        match api.update_comment(&session.token, id, content).await {
            Ok(saved) => {
                confirm_comment(&mut self.comments, id, saved);
                Ok(())
            }
            Err(e) => {
                self.comments.rollback(snap);
                Err(e)
            }
        }
    }

    pub async fn delete(
        &mut self,
        api: &dyn ForumApi,
        session: &Session,
        id: Uuid,
    ) -> Result<String, ClientError> {
        match self.comments.get(id) {
            None => return Err(not_allowed("No such comment")),
            Some(c) if !Self::can_delete(session, c) => {
                return Err(not_allowed("You can only delete your own comments"))
            }
            Some(_) => {}
        }
        let snap = self
            .comments
            .remove(id)
            .ok_or_else(|| not_allowed("No such comment"))?;
        api.delete_comment(&session.token, id).await.map_err(|e| {
            self.comments.rollback(snap);
            e
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Feed,
    Pending,
    Admin,
    Thread(Uuid),
}

/// Root of the client: owns the API handle and the per-screen state.
pub struct ForumApp<A> {
    api: A,
    screen: Screen,
    feed: FeedView,
    pending: PendingView,
    admin: Option<AdminDashboard>,
    thread: Option<CommentThread>,
}

impl<A: ForumApi> ForumApp<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            screen: Screen::Feed,
            feed: FeedView::default(),
            pending: PendingView::default(),
            admin: None,
            thread: None,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn feed(&self) -> &FeedView {
        &self.feed
    }

    pub fn pending(&self) -> &PendingView {
        &self.pending
    }

    pub fn admin(&self) -> Option<&AdminDashboard> {
        self.admin.as_ref()
    }

    pub fn thread(&self) -> Option<&CommentThread> {
        self.thread.as_ref()
    }

    /// Drops everything cached for the previous user.
    pub fn reset(&mut self) {
        self.screen = Screen::Feed;
        self.feed = FeedView::default();
        self.pending = PendingView::default();
        self.admin = None;
        self.thread = None;
    }

    /// The feed is refetched on every switch back to it.
    pub async fn show_feed(&mut self) -> Result<(), ClientError> {
        self.feed.load(&self.api).await?;
        self.screen = Screen::Feed;
        Ok(())
    }

    pub async fn show_pending(&mut self, session: &Session) -> Result<(), ClientError> {
        self.pending.ensure_loaded(&self.api, session).await?;
        self.screen = Screen::Pending;
        Ok(())
    }

    pub async fn show_admin(&mut self, session: &Session) -> Result<(), ClientError> {
        self.admin = Some(AdminDashboard::load(&self.api, session).await?);
        self.screen = Screen::Admin;
        Ok(())
    }

    pub async fn open_thread(&mut self, question_id: Uuid) -> Result<(), ClientError> {
        self.thread = Some(CommentThread::open(&self.api, question_id).await?);
        self.screen = Screen::Thread(question_id);
        Ok(())
    }

    pub async fn ask(
        &mut self,
        session: &Session,
        question: &str,
        tag: &str,
    ) -> Result<Question, ClientError> {
        let saved = self
            .api
            .create_question(&session.token, question, tag)
            .await?;
        self.pending.record_submitted(saved.clone());
        Ok(saved)
    }

    pub async fn edit_question(
        &mut self,
        session: &Session,
        id: Uuid,
        text: &str,
    ) -> Result<(), ClientError> {
        self.feed.edit(&self.api, session, id, text).await
    }

    /// On the admin screen this is the dashboard's unconditional delete.
    pub async fn delete_question(
        &mut self,
        session: &Session,
        id: Uuid,
    ) -> Result<String, ClientError> {
        match (self.screen, self.admin.as_mut()) {
            (Screen::Admin, Some(admin)) => admin.delete_post(&self.api, session, id).await,
            _ => self.feed.delete(&self.api, session, id).await,
        }
    }

    pub async fn decide(
        &mut self,
        session: &Session,
        id: Uuid,
        approve: bool,
    ) -> Result<Question, ClientError> {
        match (self.screen, self.admin.as_mut()) {
            (Screen::Admin, Some(admin)) => admin.decide(&self.api, session, id, approve).await,
            _ => Err(not_allowed("Open the admin dashboard first")),
        }
    }

    pub async fn comment(&mut self, session: &Session, content: &str) -> Result<(), ClientError> {
        let thread = self
            .thread
            .as_mut()
            .ok_or_else(|| not_allowed("Open a question's comments first"))?;
        thread.add(&self.api, session, content).await
    }

    pub async fn edit_comment(
        &mut self,
        session: &Session,
        id: Uuid,
        content: &str,
    ) -> Result<(), ClientError> {
        let thread = self
            .thread
            .as_mut()
            .ok_or_else(|| not_allowed("Open a question's comments first"))?;
        thread.edit(&self.api, session, id, content).await
    }

    pub async fn delete_comment(
        &mut self,
        session: &Session,
        id: Uuid,
    ) -> Result<String, ClientError> {
        let thread = self
            .thread
            .as_mut()
            .ok_or_else(|| not_allowed("Open a question's comments first"))?;
        thread.delete(&self.api, session, id).await
    }
}
