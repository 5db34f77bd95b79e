use std::rc::Rc;

use crate::api::{
    self, Book, BookDetail, CommentCreated, Confirmation, Group, GroupDetail, NewGroup, NewPost,
    Post, User,
};
use crate::error::Result;

pub trait IdentityService {
    fn current_user(&self) -> Result<User>;
}

pub trait DiscussionService {
    fn list_posts(&self, group_id: i64) -> Result<Vec<Post>>;
    fn create_post(&self, group_id: i64, post: &NewPost) -> Result<Post>;
    fn create_comment(&self, group_id: i64, post_id: i64, content: &str)
        -> Result<CommentCreated>;
}

pub trait GroupService {
    fn list_groups(&self) -> Result<Vec<Group>>;
    fn group_detail(&self, group_id: i64) -> Result<GroupDetail>;
    fn create_group(&self, group: &NewGroup) -> Result<Group>;
    fn join_group(&self, group_id: i64) -> Result<Confirmation>;
}

pub trait BookService {
    fn search_books(&self, query: &str, genre: &str) -> Result<Vec<Book>>;
    fn book_detail(&self, book_id: i64) -> Result<BookDetail>;
}

pub struct BackendIdentityService {
    client: Rc<api::Client>,
}

impl BackendIdentityService {
    pub fn new(client: Rc<api::Client>) -> Self {
        Self { client }
    }
}

impl IdentityService for BackendIdentityService {
    fn current_user(&self) -> Result<User> {
        self.client.current_user()
    }
}

pub struct BackendDiscussionService {
    client: Rc<api::Client>,
}

impl BackendDiscussionService {
    pub fn new(client: Rc<api::Client>) -> Self {
        Self { client }
    }
}

impl DiscussionService for BackendDiscussionService {
    fn list_posts(&self, group_id: i64) -> Result<Vec<Post>> {
        self.client.discussion(group_id)
    }

    fn create_post(&self, group_id: i64, post: &NewPost) -> Result<Post> {
        self.client.create_post(group_id, post)
    }

    fn create_comment(
        &self,
        group_id: i64,
        post_id: i64,
        content: &str,
    ) -> Result<CommentCreated> {
        self.client.create_comment(group_id, post_id, content)
    }
}

pub struct BackendGroupService {
    client: Rc<api::Client>,
}

impl BackendGroupService {
    pub fn new(client: Rc<api::Client>) -> Self {
        Self { client }
    }
}

impl GroupService for BackendGroupService {
    fn list_groups(&self) -> Result<Vec<Group>> {
        self.client.groups()
    }

    fn group_detail(&self, group_id: i64) -> Result<GroupDetail> {
        self.client.group(group_id)
    }

    fn create_group(&self, group: &NewGroup) -> Result<Group> {
        self.client.create_group(group)
    }

    fn join_group(&self, group_id: i64) -> Result<Confirmation> {
        self.client.join_group(group_id)
    }
}

pub struct BackendBookService {
    client: Rc<api::Client>,
}

impl BackendBookService {
    pub fn new(client: Rc<api::Client>) -> Self {
        Self { client }
    }
}

impl BookService for BackendBookService {
    fn search_books(&self, query: &str, genre: &str) -> Result<Vec<Book>> {
        self.client.books(query, genre)
    }

    fn book_detail(&self, book_id: i64) -> Result<BookDetail> {
        self.client.book(book_id)
    }
}
