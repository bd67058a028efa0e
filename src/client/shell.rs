//! Line-oriented front end over [`ForumApp`].

use std::fmt::Write as _;
use std::io::Write as _;
use std::str::FromStr;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use uuid::Uuid;

use super::api::ForumApi;
use super::session::{Session, SessionStore};
use super::views::{CommentThread, FeedView, ForumApp};
use crate::auth::dto::{LoginRequest, RegisterRequest};
use crate::auth::Role;
use crate::comments::dto::CommentView;
use crate::questions::dto::QuestionView;

pub const HELP: &str = "\
commands:
  register <name> <email> <password> <confirm> [admin]
  login <email> <password>
  logout
  feed                          approved questions
  pending                       your questions awaiting approval
  admin                         moderation dashboard (admins)
  ask <tag> <question...>
  edit <question-id> <text...>
  delete <question-id>
  comments <question-id>        open a question's comments
  comment <text...>             comment on the open question
  edit-comment <comment-id> <text...>
  delete-comment <comment-id>
  approve <question-id>
  reject <question-id>
  help
  quit";

const LOGIN_FIRST: &str = "Please log in first (login <email> <password>)";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Register {
        name: String,
        email: String,
        password: String,
        confirm: String,
        admin: bool,
    },
    Login {
        email: String,
        password: String,
    },
    Logout,
    Feed,
    Pending,
    Admin,
    Ask {
        tag: String,
        question: String,
    },
    Edit {
        id: Uuid,
        text: String,
    },
    Delete {
        id: Uuid,
    },
    Comments {
        question_id: Uuid,
    },
    Comment {
        content: String,
    },
    EditComment {
        id: Uuid,
        content: String,
    },
    DeleteComment {
        id: Uuid,
    },
    Approve {
        id: Uuid,
    },
    Reject {
        id: Uuid,
    },
    Help,
    Quit,
}

impl Command {
    /// Commands available without a session.
    pub fn is_public(&self) -> bool {
        matches!(
            self,
            Command::Register { .. } | Command::Login { .. } | Command::Help | Command::Quit
        )
    }
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command `{0}`; type `help`")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("`{0}` is not a valid id")]
    BadId(String),
}

/// First word and the trimmed remainder.
fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(i) => (&s[..i], s[i..].trim()),
        None => (s, ""),
    }
}

fn parse_id(word: &str) -> Result<Uuid, CommandError> {
    Uuid::parse_str(word).map_err(|_| CommandError::BadId(word.to_string()))
}

/// `<id> <text...>` with both parts present.
fn id_and_text(rest: &str, usage: &'static str) -> Result<(Uuid, String), CommandError> {
    let (id, text) = split_word(rest);
    if id.is_empty() || text.is_empty() {
        return Err(CommandError::Usage(usage));
    }
    Ok((parse_id(id)?, text.to_string()))
}

fn only_id(rest: &str, usage: &'static str) -> Result<Uuid, CommandError> {
    let (id, extra) = split_word(rest);
    if id.is_empty() || !extra.is_empty() {
        return Err(CommandError::Usage(usage));
    }
    parse_id(id)
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let (word, rest) = split_word(line);
        let cmd = match word {
            "register" => {
                const USAGE: &str = "register <name> <email> <password> <confirm> [admin]";
                let args: Vec<&str> = rest.split_whitespace().collect();
                match args.as_slice() {
                    [name, email, password, confirm] | [name, email, password, confirm, "admin"] => {
                        Command::Register {
                            name: name.to_string(),
                            email: email.to_string(),
                            password: password.to_string(),
                            confirm: confirm.to_string(),
                            admin: args.len() == 5,
                        }
                    }
                    _ => return Err(CommandError::Usage(USAGE)),
                }
            }
            "login" => match rest.split_whitespace().collect::<Vec<_>>().as_slice() {
                [email, password] => Command::Login {
                    email: email.to_string(),
                    password: password.to_string(),
                },
                _ => return Err(CommandError::Usage("login <email> <password>")),
            },
            "logout" => Command::Logout,
            "feed" => Command::Feed,
            "pending" => Command::Pending,
            "admin" => Command::Admin,
            "ask" => {
                let (tag, question) = split_word(rest);
                if tag.is_empty() || question.is_empty() {
                    return Err(CommandError::Usage("ask <tag> <question...>"));
                }
                Command::Ask {
                    tag: tag.to_string(),
                    question: question.to_string(),
                }
            }
            "edit" => {
                let (id, text) = id_and_text(rest, "edit <question-id> <text...>")?;
                Command::Edit { id, text }
            }
            "delete" => Command::Delete {
                id: only_id(rest, "delete <question-id>")?,
            },
            "comments" => Command::Comments {
                question_id: only_id(rest, "comments <question-id>")?,
            },
            "comment" => {
                if rest.is_empty() {
                    return Err(CommandError::Usage("comment <text...>"));
                }
                Command::Comment {
                    content: rest.to_string(),
                }
            }
            "edit-comment" => {
                let (id, content) = id_and_text(rest, "edit-comment <comment-id> <text...>")?;
                Command::EditComment { id, content }
            }
            "delete-comment" => Command::DeleteComment {
                id: only_id(rest, "delete-comment <comment-id>")?,
            },
            "approve" => Command::Approve {
                id: only_id(rest, "approve <question-id>")?,
            },
            "reject" => Command::Reject {
                id: only_id(rest, "reject <question-id>")?,
            },
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(cmd)
    }
}

fn author_name(author: Option<&crate::shared::AuthorSummary>) -> &str {
    author.map(|a| a.name.as_str()).unwrap_or("unknown")
}

/// One line per question; `*` marks questions the session user may edit.
pub fn render_questions(title: &str, questions: &[QuestionView], session: &Session) -> String {
    let mut out = format!("== {title} ({}) ==", questions.len());
    if questions.is_empty() {
        out.push_str("\n  (nothing here)");
    }
    for q in questions {
        let mark = if FeedView::can_modify(session, q) { '*' } else { ' ' };
        let _ = write!(
            out,
            "\n{mark} {} [{}] {} (by {})",
            q.question.id,
            q.question.tag,
            q.question.question,
            author_name(q.author.as_ref()),
        );
    }
    out
}

pub fn render_comments(thread: &CommentThread, session: &Session) -> String {
    let comments: &[CommentView] = thread.comments();
    let mut out = format!(
        "== comments on {} ({}) ==",
        thread.question_id(),
        comments.len()
    );
    if comments.is_empty() {
        out.push_str("\n  (no comments yet)");
    }
    for c in comments {
        let mark = if CommentThread::can_edit(session, c) { '*' } else { ' ' };
        let _ = write!(
            out,
            "\n{mark} {} {}: {}",
            c.comment.id,
            author_name(c.author.as_ref()),
            c.comment.content,
        );
    }
    out
}

pub enum Outcome {
    Continue(String),
    Quit,
}

pub struct Shell<A> {
    app: ForumApp<A>,
    store: SessionStore,
    session: Option<Session>,
}

impl<A: ForumApi> Shell<A> {
    /// Restores a saved session, if any.
    pub fn new(api: A, store: SessionStore) -> anyhow::Result<Self> {
        let session = store.load()?;
        Ok(Self {
            app: ForumApp::new(api),
            store,
            session,
        })
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    fn prompt(&self) -> String {
        match &self.session {
            Some(s) if s.is_admin() => format!("{} (admin)> ", s.name),
            Some(s) => format!("{}> ", s.name),
            None => "guest> ".to_string(),
        }
    }

    pub async fn execute(&mut self, cmd: Command) -> anyhow::Result<Outcome> {
        let session = self.session.clone();
        if session.is_none() && !cmd.is_public() {
            return Ok(Outcome::Continue(LOGIN_FIRST.into()));
        }
        let out = match (cmd, session) {
            (Command::Quit, _) => return Ok(Outcome::Quit),
            (Command::Help, _) => HELP.to_string(),
            (
                Command::Register {
                    name,
                    email,
                    password,
                    confirm,
                    admin,
                },
                _,
            ) => {
                let req = RegisterRequest {
                    name: Some(name),
                    email: Some(email),
                    password: Some(password),
                    confirm_password: Some(confirm),
                    role: admin.then_some(Role::Admin),
                };
                self.app.api().register(&req).await?.message
            }
            (Command::Login { email, password }, _) => {
                let req = LoginRequest {
                    email: Some(email),
                    password: Some(password),
                };
                let res = self.app.api().login(&req).await?;
                match Session::from_login(&res) {
                    Some(session) => {
                        self.store.save(&session)?;
                        info!(user_id = %session.user_id, "logged in");
                        self.app.reset();
                        self.session = Some(session.clone());
                        match self.app.show_feed().await {
                            Ok(()) => {
                                let feed =
                                    render_questions("feed", self.app.feed().questions(), &session);
                                format!("{}\n{feed}", res.message)
                            }
                            Err(e) => {
                                warn!(error = %e, "feed load after login failed");
                                format!("{}\nError loading feed: {e}", res.message)
                            }
                        }
                    }
                    None => res.message,
                }
            }
            (Command::Logout, _) => {
                self.store.clear()?;
                self.session = None;
                self.app.reset();
                "Logged out".to_string()
            }
            (cmd, Some(session)) => self.execute_authenticated(cmd, &session).await?,
            (_, None) => LOGIN_FIRST.to_string(),
        };
        Ok(Outcome::Continue(out))
    }

    async fn execute_authenticated(
        &mut self,
        cmd: Command,
        session: &Session,
    ) -> anyhow::Result<String> {
        let out = match cmd {
            Command::Feed => {
                self.app.show_feed().await?;
                render_questions("feed", self.app.feed().questions(), session)
            }
            Command::Pending => {
                self.app.show_pending(session).await?;
                render_questions("your pending questions", self.app.pending().questions(), session)
            }
            Command::Admin => {
                self.app.show_admin(session).await?;
                match self.app.admin() {
                    Some(dash) => format!(
                        "{}\n{}",
                        render_questions("pending approval", dash.pending(), session),
                        render_questions("approved posts", dash.approved(), session),
                    ),
                    None => String::new(),
                }
            }
            Command::Ask { tag, question } => {
                self.app.ask(session, &question, &tag).await?;
                "Question submitted for approval".to_string()
            }
            Command::Edit { id, text } => {
                self.app.edit_question(session, id, &text).await?;
                "Question updated".to_string()
            }
            Command::Delete { id } => self.app.delete_question(session, id).await?,
            Command::Comments { question_id } => {
                self.app.open_thread(question_id).await?;
                self.render_thread(session)
            }
            Command::Comment { content } => {
                self.app.comment(session, &content).await?;
                self.render_thread(session)
            }
            Command::EditComment { id, content } => {
                self.app.edit_comment(session, id, &content).await?;
                self.render_thread(session)
            }
            Command::DeleteComment { id } => self.app.delete_comment(session, id).await?,
            Command::Approve { id } => {
                self.app.decide(session, id, true).await?;
                "Question approved".to_string()
            }
            Command::Reject { id } => {
                self.app.decide(session, id, false).await?;
                "Question rejected".to_string()
            }
            Command::Register { .. }
            | Command::Login { .. }
            | Command::Logout
            | Command::Help
            | Command::Quit => String::new(),
        };
        Ok(out)
    }

    fn render_thread(&self, session: &Session) -> String {
        self.app
            .thread()
            .map(|t| render_comments(t, session))
            .unwrap_or_default()
    }

    /// Reads commands from stdin until `quit` or end of input.
    pub async fn run(mut self) -> anyhow::Result<()> {
        println!("Q&A forum client. Type `help` for commands.");
        if let Some(session) = self.session.clone() {
            println!("Welcome back, {}.", session.name);
            match self.app.show_feed().await {
                Ok(()) => println!(
                    "{}",
                    render_questions("feed", self.app.feed().questions(), &session)
                ),
                Err(e) => println!("Error: {e}"),
            }
        }

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            print!("{}", self.prompt());
            std::io::stdout().flush()?;
            let Some(line) = lines.next_line().await? else {
                break;
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match line.parse::<Command>() {
                Err(e) => println!("{e}"),
                Ok(cmd) => match self.execute(cmd).await {
                    Ok(Outcome::Quit) => break,
                    Ok(Outcome::Continue(out)) if out.is_empty() => {}
                    Ok(Outcome::Continue(out)) => println!("{out}"),
                    Err(e) => println!("Error: {e}"),
                },
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use time::OffsetDateTime;

    use super::*;
    use crate::auth::dto::{LoginResponse, LoginUser, RegisterResponse};
    use crate::client::api::{ClientError, HttpForumClient};
    use crate::comments::repo_types::Comment;
    use crate::questions::repo_types::Question;
    use crate::shared::AuthorSummary;

    fn temp_store() -> SessionStore {
        SessionStore::new(
            std::env::temp_dir()
                .join(format!("qa-forum-{}", Uuid::new_v4()))
                .join("session.json"),
        )
    }

    /// Accepts any login; every other call fails as if the server went away.
    struct FlakyApi {
        user_id: Uuid,
    }

    fn down<T>() -> Result<T, ClientError> {
        Err(ClientError::Api {
            status: 503,
            message: "Service unavailable".into(),
        })
    }

    #[async_trait]
    impl ForumApi for FlakyApi {
        async fn register(&self, _req: &RegisterRequest) -> Result<RegisterResponse, ClientError> {
            down()
        }

        async fn login(&self, _req: &LoginRequest) -> Result<LoginResponse, ClientError> {
            Ok(LoginResponse {
                success: true,
                message: "Login successful".into(),
                user: Some(LoginUser {
                    name: "Ada".into(),
                    email: "ada@example.com".into(),
                    role: Role::User,
                    user_id: self.user_id,
                }),
                token: Some("tok".into()),
            })
        }

        async fn approved_questions(&self) -> Result<Vec<QuestionView>, ClientError> {
            down()
        }

        async fn pending_questions(&self, _token: &str) -> Result<Vec<QuestionView>, ClientError> {
            down()
        }

        async fn user_pending_questions(
            &self,
            _token: &str,
            _user_id: Uuid,
        ) -> Result<Vec<QuestionView>, ClientError> {
            down()
        }

        async fn create_question(&self, _: &str, _: &str, _: &str) -> Result<Question, ClientError> {
            down()
        }

        async fn update_question(&self, _: &str, _: Uuid, _: &str) -> Result<Question, ClientError> {
            down()
        }

        async fn delete_question(&self, _: &str, _: Uuid) -> Result<String, ClientError> {
            down()
        }

        async fn approve_question(&self, _: &str, _: Uuid, _: bool) -> Result<Question, ClientError> {
            down()
        }

        async fn comments(&self, _question_id: Uuid) -> Result<Vec<CommentView>, ClientError> {
            down()
        }

        async fn create_comment(&self, _: &str, _: Uuid, _: &str) -> Result<Comment, ClientError> {
            down()
        }

        async fn update_comment(&self, _: &str, _: Uuid, _: &str) -> Result<Comment, ClientError> {
            down()
        }

        async fn delete_comment(&self, _: &str, _: Uuid) -> Result<String, ClientError> {
            down()
        }
    }

    fn session() -> Session {
        Session {
            token: "tok".into(),
            user_id: Uuid::new_v4(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            role: Role::User,
        }
    }

    #[test]
    fn parses_text_arguments_with_spaces() {
        let id = Uuid::new_v4();
        assert_eq!(
            "ask rust  How do lifetimes work?".parse::<Command>().unwrap(),
            Command::Ask {
                tag: "rust".into(),
                question: "How do lifetimes work?".into()
            }
        );
        assert_eq!(
            format!("edit {id} new text here").parse::<Command>().unwrap(),
            Command::Edit {
                id,
                text: "new text here".into()
            }
        );
        assert_eq!(
            "comment nice one".parse::<Command>().unwrap(),
            Command::Comment {
                content: "nice one".into()
            }
        );
    }

    #[test]
    fn parses_register_with_optional_admin_flag() {
        let cmd: Command = "register ada a@b.io pw pw admin".parse().unwrap();
        assert!(matches!(cmd, Command::Register { admin: true, .. }));
        let cmd: Command = "register ada a@b.io pw pw".parse().unwrap();
        assert!(matches!(cmd, Command::Register { admin: false, .. }));
        assert!(matches!(
            "register ada a@b.io pw".parse::<Command>(),
            Err(CommandError::Usage(_))
        ));
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(
            "frobnicate".parse::<Command>(),
            Err(CommandError::Unknown("frobnicate".into()))
        );
        assert_eq!(
            "delete 42".parse::<Command>(),
            Err(CommandError::BadId("42".into()))
        );
        assert!(matches!(
            "approve".parse::<Command>(),
            Err(CommandError::Usage(_))
        ));
    }

    #[test]
    fn render_marks_own_questions() {
        let me = session();
        let now = OffsetDateTime::now_utc();
        let mine = Question {
            id: Uuid::new_v4(),
            user_id: me.user_id,
            question: "Mine?".into(),
            tag: "t".into(),
            is_approved: true,
            created_at: now,
            updated_at: now,
        };
        let theirs = Question {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            question: "Theirs?".into(),
            ..mine.clone()
        };
        let views = vec![
            QuestionView {
                question: mine.clone(),
                author: Some(AuthorSummary {
                    id: me.user_id,
                    name: "Ada".into(),
                    email: me.email.clone(),
                }),
            },
            QuestionView::from(theirs),
        ];
        let out = render_questions("feed", &views, &me);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "== feed (2) ==");
        assert!(lines[1].starts_with(&format!("* {}", mine.id)));
        assert!(lines[1].ends_with("(by Ada)"));
        assert!(lines[2].starts_with("  "));
        assert!(lines[2].ends_with("(by unknown)"));
    }

    #[tokio::test]
    async fn commands_need_a_session() {
        let store = temp_store();
        let mut shell = Shell::new(HttpForumClient::new("http://127.0.0.1:9/api"), store).unwrap();
        assert!(shell.session().is_none());

        match shell.execute(Command::Feed).await.unwrap() {
            Outcome::Continue(msg) => assert!(msg.starts_with("Please log in")),
            Outcome::Quit => panic!("feed should not quit"),
        }
        assert!(matches!(
            shell.execute(Command::Quit).await.unwrap(),
            Outcome::Quit
        ));
    }

    #[tokio::test]
    async fn login_keeps_the_session_when_the_feed_fails() {
        let user_id = Uuid::new_v4();
        let store = temp_store();
        let mut shell = Shell::new(FlakyApi { user_id }, store.clone()).unwrap();

        let login = Command::Login {
            email: "ada@example.com".into(),
            password: "pw".into(),
        };
        match shell.execute(login).await.unwrap() {
            Outcome::Continue(msg) => {
                assert!(msg.starts_with("Login successful"));
                assert!(msg.contains("Error loading feed"));
            }
            Outcome::Quit => panic!("login should not quit"),
        }
        assert_eq!(shell.session().map(|s| s.user_id), Some(user_id));
        assert_eq!(store.load().unwrap().map(|s| s.user_id), Some(user_id));
    }
}
