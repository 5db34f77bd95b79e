use std::io::{self, Write};
use std::rc::Rc;

use anyhow::{anyhow, bail, Context, Result};
use url::Url;

use crate::api::{self, NewGroup};
use crate::config;
use crate::dashboard::Dashboard;
use crate::data::{
    BackendBookService, BackendDiscussionService, BackendGroupService, BackendIdentityService,
    BookService, DiscussionService, GroupService,
};
use crate::error::Error;
use crate::logging;
use crate::render;
use crate::reply::ReplyController;
use crate::schedule;
use crate::session::Session;
use crate::thread::{Reconciled, ThreadStore};

pub const USAGE: &str = "Bookclub - shared reading groups from the terminal.

Usage: bookclub [FLAGS] [COMMAND]

Flags:
  --version, -V                         Show version and exit
  --help,    -h                         Show this help message

Commands:
  dashboard                             Groups, progress and reminders (default)
  groups                                List your reading groups
  group <group-id>                      Show a group with its members
  discussion <group-id>                 Show a group's discussion
  post <group-id> <text...>             Start a new discussion post
  reply <group-id> <post-id> <text...>  Reply to a post
  join <group-id>                       Join a reading group
  create-group <name> <book-id> <start> <end>
                                        Create a group (dates as YYYY-MM-DD)
  books [query...]                      Search books by title or author
  book <book-id>                        Show a book and its open groups";

const GROUP_UNAVAILABLE: &str = "Group not found or you don't have access.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Dashboard,
    Groups,
    Group(i64),
    Discussion(i64),
    Post { group_id: i64, text: String },
    Reply { group_id: i64, post_id: i64, text: String },
    Join(i64),
    CreateGroup { name: String, book: String, start: String, end: String },
    Books { query: String },
    Book(i64),
}

fn parse_id(kind: &str, raw: Option<&String>) -> Result<i64> {
    let raw = raw.ok_or_else(|| anyhow!("missing {kind} id\n\n{USAGE}"))?;
    raw.parse::<i64>()
        .with_context(|| format!("invalid {kind} id {raw:?}"))
}

impl Command {
    pub fn parse(args: &[String]) -> Result<Command> {
        let Some((name, rest)) = args.split_first() else {
            return Ok(Command::Dashboard);
        };
        let text_from = |start: usize| rest.get(start..).unwrap_or_default().join(" ");
        let command = match name.as_str() {
            "dashboard" => Command::Dashboard,
            "groups" => Command::Groups,
            "group" => Command::Group(parse_id("group", rest.first())?),
            "discussion" => Command::Discussion(parse_id("group", rest.first())?),
            "post" => Command::Post {
                group_id: parse_id("group", rest.first())?,
                text: text_from(1),
            },
            "reply" => Command::Reply {
                group_id: parse_id("group", rest.first())?,
                post_id: parse_id("post", rest.get(1))?,
                text: text_from(2),
            },
            "join" => Command::Join(parse_id("group", rest.first())?),
            "create-group" => {
                let field = |i: usize| rest.get(i).cloned().unwrap_or_default();
                Command::CreateGroup {
                    name: field(0),
                    book: field(1),
                    start: field(2),
                    end: field(3),
                }
            }
            "books" => Command::Books { query: text_from(0) },
            "book" => Command::Book(parse_id("book", rest.first())?),
            other => bail!("unknown command {other:?}\n\n{USAGE}"),
        };
        Ok(command)
    }
}

pub struct App {
    session: Session,
    api_base: Url,
    discussion: Rc<dyn DiscussionService>,
    groups: Rc<dyn GroupService>,
    books: Rc<dyn BookService>,
}

impl App {
    pub fn new(
        session: Session,
        api_base: Url,
        discussion: Rc<dyn DiscussionService>,
        groups: Rc<dyn GroupService>,
        books: Rc<dyn BookService>,
    ) -> Self {
        Self {
            session,
            api_base,
            discussion,
            groups,
            books,
        }
    }

    fn thread(&self, group_id: i64) -> ThreadStore {
        ThreadStore::new(self.discussion.clone(), self.session.clone(), group_id)
    }

    pub fn execute(&self, command: Command, out: &mut dyn Write) -> Result<()> {
        match command {
            Command::Dashboard => {
                let view = Dashboard::load(&self.session, self.groups.as_ref(), schedule::local_now())?;
                write!(out, "{}", render::dashboard(&view))?;
            }
            Command::Groups => {
                let groups = self.groups.list_groups()?;
                write!(out, "{}", render::group_list(&groups))?;
            }
            Command::Group(group_id) => {
                let detail = self.groups.group_detail(group_id).map_err(|err| {
                    let message = err.user_message();
                    if message.is_empty() {
                        anyhow!(GROUP_UNAVAILABLE)
                    } else {
                        anyhow!("{message}")
                    }
                })?;
                write!(out, "{}", render::group_detail(&detail, &self.api_base))?;
            }
            Command::Discussion(group_id) => {
                let mut store = self.thread(group_id);
                store.load()?;
                write!(out, "{}", render::thread(&store))?;
            }
            Command::Post { group_id, text } => {
                let mut store = self.thread(group_id);
                store.load()?;
                let Some(post) = store.create_post(&text)? else {
                    bail!(Error::validation("Post content cannot be empty"));
                };
                writeln!(out, "Posted #{}", post.id)?;
                write!(out, "{}", render::thread(&store))?;
            }
            Command::Reply {
                group_id,
                post_id,
                text,
            } => {
                let mut store = self.thread(group_id);
                store.load()?;
                if store.post(post_id).is_none() {
                    bail!(Error::validation(format!("Post #{post_id} not found")));
                }
                let mut reply = ReplyController::new();
                reply.start_reply(post_id);
                reply.edit(text);
                match reply.submit(&mut store)? {
                    Some(Reconciled::Dropped) => {
                        writeln!(out, "Reply sent; post #{post_id} is no longer in view")?;
                    }
                    Some(_) => {
                        if let Some(post) = store.post(post_id) {
                            write!(out, "{}", render::post(&store, post))?;
                        }
                    }
                    None => bail!(Error::validation("Reply cannot be empty")),
                }
            }
            Command::Join(group_id) => {
                let confirmation = self.groups.join_group(group_id)?;
                let message = if confirmation.message.is_empty() {
                    "Joined group successfully!".to_string()
                } else {
                    confirmation.message
                };
                writeln!(out, "{message}")?;
            }
            Command::CreateGroup {
                name,
                book,
                start,
                end,
            } => {
                let request = NewGroup::parse(&name, &book, &start, &end)?;
                let group = self.groups.create_group(&request)?;
                writeln!(out, "Group created successfully! (#{} {})", group.id, group.name)?;
            }
            Command::Books { query } => {
                let books = self.books.search_books(&query, "")?;
                write!(out, "{}", render::book_list(&books))?;
            }
            Command::Book(book_id) => {
                let detail = self.books.book_detail(book_id)?;
                write!(out, "{}", render::book_detail(&detail))?;
            }
        }
        Ok(())
    }
}

pub fn run(command: Command) -> Result<()> {
    let cfg = config::load(config::LoadOptions::default()).context("load config")?;
    logging::init(&cfg.log)?;

    let credentials = cfg.auth.credentials();
    let client = api::Client::new(api::ClientConfig {
        user_agent: cfg.api.user_agent.clone(),
        base_url: Some(cfg.api.base_url.clone()),
        timeout: Some(cfg.api.timeout),
        credentials: credentials.clone(),
        http_client: None,
    })
    .context("build api client")?;
    let client = Rc::new(client);

    let session = Session::resume(&credentials, &BackendIdentityService::new(client.clone()))?;
    let app = App::new(
        session,
        client.base_url().clone(),
        Rc::new(BackendDiscussionService::new(client.clone())),
        Rc::new(BackendGroupService::new(client.clone())),
        Rc::new(BackendBookService::new(client)),
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    app.execute(command, &mut out)
}

/// The message shown to the user for a failed command.
pub fn describe_error(err: &anyhow::Error) -> String {
    match err.downcast_ref::<Error>() {
        Some(inner) => inner.user_message(),
        None => format!("{err:#}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use chrono::NaiveDate;

    use crate::api::{Book, BookDetail, CommentCreated, Confirmation, Group, GroupDetail};
    use crate::error;
    use crate::thread::tests::{comment, post, session, FakeDiscussion};
    use crate::thread::FORUM_ACCESS_NOTICE;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[derive(Default)]
    struct FakeGroups {
        created: RefCell<Option<NewGroup>>,
    }

    impl GroupService for FakeGroups {
        fn list_groups(&self) -> error::Result<Vec<Group>> {
            Ok(Vec::new())
        }

        fn group_detail(&self, _group_id: i64) -> error::Result<GroupDetail> {
            Err(Error::ForumAccess("Not a member of this group".into()))
        }

        fn create_group(&self, group: &NewGroup) -> error::Result<Group> {
            *self.created.borrow_mut() = Some(group.clone());
            Ok(Group {
                id: 11,
                name: group.name.clone(),
                book: Some(group.book),
                book_title: String::new(),
                creator_name: "ana".into(),
                start_date: group.start_date,
                end_date: group.end_date,
                member_count: 1,
                is_full: false,
                members: Vec::new(),
            })
        }

        fn join_group(&self, _group_id: i64) -> error::Result<Confirmation> {
            Err(Error::Validation("Group is full".into()))
        }
    }

    struct NoBooks;

    impl BookService for NoBooks {
        fn search_books(&self, _query: &str, _genre: &str) -> error::Result<Vec<Book>> {
            Ok(Vec::new())
        }

        fn book_detail(&self, _book_id: i64) -> error::Result<BookDetail> {
            Err(Error::Server {
                status: 404,
                message: "Book not found".into(),
            })
        }
    }

    fn app(discussion: Rc<FakeDiscussion>, groups: Rc<FakeGroups>) -> App {
        App::new(
            session(),
            Url::parse("http://localhost:8000/api/").unwrap(),
            discussion,
            groups,
            Rc::new(NoBooks),
        )
    }

    fn output(app: &App, command: Command) -> Result<String> {
        let mut buf = Vec::new();
        app.execute(command, &mut buf)?;
        Ok(String::from_utf8(buf).unwrap())
    }

    #[test]
    fn parse_defaults_to_dashboard() {
        assert_eq!(Command::parse(&[]).unwrap(), Command::Dashboard);
    }

    #[test]
    fn parse_joins_free_text() {
        let cmd = Command::parse(&args(&["reply", "3", "9", "well", "said"])).unwrap();
        assert_eq!(
            cmd,
            Command::Reply {
                group_id: 3,
                post_id: 9,
                text: "well said".into()
            }
        );
        let cmd = Command::parse(&args(&["post", "3"])).unwrap();
        assert_eq!(
            cmd,
            Command::Post {
                group_id: 3,
                text: String::new()
            }
        );
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!(Command::parse(&args(&["discussion"])).is_err());
        assert!(Command::parse(&args(&["discussion", "abc"])).is_err());
        assert!(Command::parse(&args(&["launch"])).is_err());
    }

    #[test]
    fn blank_post_is_rejected_without_request() {
        let fake = Rc::new(FakeDiscussion::default());
        let app = app(fake.clone(), Rc::new(FakeGroups::default()));
        let err = output(
            &app,
            Command::Post {
                group_id: 1,
                text: "   ".into(),
            },
        )
        .unwrap_err();
        assert_eq!(describe_error(&err), "Post content cannot be empty");
        assert_eq!(fake.calls.get(), 1);
    }

    #[test]
    fn reply_renders_updated_post() {
        let fake = Rc::new(FakeDiscussion::default());
        *fake.posts.borrow_mut() = vec![post(1, "bo", vec![comment(1, "bo", "first")])];
        *fake.next_comment.borrow_mut() = Some(CommentCreated::Comment(comment(2, "ana", "nice")));
        let app = app(fake, Rc::new(FakeGroups::default()));
        let text = output(
            &app,
            Command::Reply {
                group_id: 1,
                post_id: 1,
                text: "nice".into(),
            },
        )
        .unwrap();
        assert!(text.contains("> bo"));
        assert!(text.contains("> ana"));
        assert!(text.contains("nice"));
    }

    #[test]
    fn denied_discussion_reports_forum_notice() {
        let fake = Rc::new(FakeDiscussion::default());
        fake.deny.set(true);
        let app = app(fake, Rc::new(FakeGroups::default()));
        let err = output(&app, Command::Discussion(1)).unwrap_err();
        assert_eq!(describe_error(&err), FORUM_ACCESS_NOTICE);
        assert!(err.downcast_ref::<Error>().unwrap().is_terminal());
    }

    #[test]
    fn group_errors_are_surfaced() {
        let app = app(Rc::new(FakeDiscussion::default()), Rc::new(FakeGroups::default()));
        let err = output(&app, Command::Group(4)).unwrap_err();
        assert_eq!(describe_error(&err), "Not a member of this group");
        let err = output(&app, Command::Join(4)).unwrap_err();
        assert_eq!(describe_error(&err), "Group is full");
        let err = output(&app, Command::Book(4)).unwrap_err();
        assert_eq!(describe_error(&err), "Book not found");
    }

    #[test]
    fn create_group_validates_fields_first() {
        let groups = Rc::new(FakeGroups::default());
        let app = app(Rc::new(FakeDiscussion::default()), groups.clone());
        let err = output(
            &app,
            Command::CreateGroup {
                name: "Readers".into(),
                book: "2".into(),
                start: String::new(),
                end: String::new(),
            },
        )
        .unwrap_err();
        assert_eq!(describe_error(&err), "Please fill all group fields");
        assert!(groups.created.borrow().is_none());

        let text = output(
            &app,
            Command::CreateGroup {
                name: "Readers".into(),
                book: "2".into(),
                start: "2024-01-01".into(),
                end: "2024-02-01".into(),
            },
        )
        .unwrap();
        assert!(text.contains("#11 Readers"));
        let created = groups.created.borrow().clone().unwrap();
        assert_eq!(created.end_date, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
    }
}
