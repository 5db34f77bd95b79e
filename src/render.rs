use std::fmt::Write;

use chrono::{DateTime, Local, Utc};
use url::Url;

use crate::api::{Book, BookDetail, Group, GroupDetail, Post};
use crate::dashboard::Dashboard;
use crate::thread::ThreadStore;

const BAR_WIDTH: usize = 20;
const GROUP_CAPACITY: u32 = 10;

fn local_date(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d").to_string()
}

pub fn progress_bar(percentage: u8) -> String {
    let filled = usize::from(percentage.min(100)) * BAR_WIDTH / 100;
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        percentage
    )
}

pub fn dashboard(view: &Dashboard) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", view.greeting);

    if !view.reminders.is_empty() {
        let _ = writeln!(out);
        for reminder in &view.reminders {
            let _ = writeln!(out, "! {}", reminder.message);
        }
    }

    let _ = writeln!(out, "\nReading progress");
    if view.groups.is_empty() {
        let _ = writeln!(out, "  No groups yet. Join or create one!");
        return out;
    }
    for summary in &view.groups {
        let group = &summary.group;
        let _ = writeln!(out, "  #{} {}", group.id, group.name);
        let _ = writeln!(
            out,
            "     {} of schedule completed",
            progress_bar(summary.progress.percentage)
        );
        let _ = writeln!(
            out,
            "     Target: finish by {}",
            summary.progress.target_date.format("%Y-%m-%d")
        );
    }
    out
}

pub fn group_list(groups: &[Group]) -> String {
    if groups.is_empty() {
        return "No groups yet. Join or create one!\n".to_string();
    }
    let mut out = String::new();
    for group in groups {
        let _ = writeln!(
            out,
            "#{} {} - {} ({} to {})",
            group.id,
            group.name,
            group.book_title,
            group.start_date.format("%Y-%m-%d"),
            group.end_date.format("%Y-%m-%d")
        );
    }
    out
}

pub fn group_detail(detail: &GroupDetail, api_base: &Url) -> String {
    let group = &detail.group;
    let mut out = String::new();
    let _ = writeln!(out, "{}", group.name);
    if let Some(info) = &detail.book_info {
        let _ = writeln!(out, "{} by {}", info.title, info.author);
        match info.cover_src(api_base) {
            Some(src) => {
                let _ = writeln!(out, "Cover: {src}");
            }
            None => {
                let _ = writeln!(out, "No cover available");
            }
        }
    }
    let _ = writeln!(
        out,
        "Schedule: {} to {}",
        group.start_date.format("%Y-%m-%d"),
        group.end_date.format("%Y-%m-%d")
    );
    let _ = writeln!(out, "\nMembers ({})", group.members.len());
    for member in &group.members {
        match &member.joined_at {
            Some(joined) => {
                let _ = writeln!(out, "  {} (joined {})", member.username, local_date(joined));
            }
            None => {
                let _ = writeln!(out, "  {}", member.username);
            }
        }
    }
    out
}

fn post_block(out: &mut String, post: &Post, own: bool) {
    let marker = if own { " (you)" } else { "" };
    let _ = writeln!(
        out,
        "#{} {}{} - {}",
        post.id,
        post.author_name,
        marker,
        local_date(&post.created_at)
    );
    if let Some(chapter) = &post.chapter_title {
        let _ = writeln!(out, "   [{chapter}]");
    }
    for line in post.content.lines() {
        let _ = writeln!(out, "   {line}");
    }
    for comment in &post.comments {
        let _ = writeln!(
            out,
            "     > {} ({}): {}",
            comment.author_name,
            local_date(&comment.created_at),
            comment.content
        );
    }
}

pub fn post(store: &ThreadStore, post: &Post) -> String {
    let mut out = String::new();
    post_block(&mut out, post, store.is_own(post));
    out
}

pub fn thread(store: &ThreadStore) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Group discussion #{}", store.group_id());
    if store.posts().is_empty() {
        let _ = writeln!(out, "  No posts yet. Share your thoughts on the book!");
        return out;
    }
    for item in store.posts() {
        let _ = writeln!(out);
        post_block(&mut out, item, store.is_own(item));
    }
    out
}

pub fn book_list(books: &[Book]) -> String {
    if books.is_empty() {
        return "No books found.\n".to_string();
    }
    let mut out = String::new();
    for book in books {
        let _ = writeln!(out, "#{} {} by {} [{}]", book.id, book.title, book.author, book.genre);
    }
    out
}

pub fn book_detail(detail: &BookDetail) -> String {
    let book = &detail.book;
    let mut out = String::new();
    let _ = writeln!(out, "{} by {}", book.title, book.author);
    if !book.description.is_empty() {
        let _ = writeln!(out, "{}", book.description);
    }
    let _ = writeln!(out, "Genre: {} | Chapters: {}", book.genre, book.total_chapters);
    let _ = writeln!(out, "\nAvailable groups ({})", detail.available_groups.len());
    if detail.available_groups.is_empty() {
        let _ = writeln!(out, "  No groups available for this book.");
    }
    for group in &detail.available_groups {
        let _ = writeln!(
            out,
            "  #{} {} - members {}/{} ({} to {})",
            group.id,
            group.name,
            group.member_count,
            GROUP_CAPACITY,
            group.start_date.format("%Y-%m-%d"),
            group.end_date.format("%Y-%m-%d")
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    use chrono::NaiveDate;

    use crate::api::BookInfo;
    use crate::thread::tests::{comment, post as make_post, session, FakeDiscussion};

    #[test]
    fn progress_bar_scales() {
        assert_eq!(progress_bar(0), format!("[{}]   0%", "-".repeat(20)));
        assert_eq!(progress_bar(50), format!("[{}{}]  50%", "#".repeat(10), "-".repeat(10)));
        assert_eq!(progress_bar(100), format!("[{}] 100%", "#".repeat(20)));
    }

    #[test]
    fn thread_marks_own_posts_and_comments() {
        let fake = Rc::new(FakeDiscussion::default());
        *fake.posts.borrow_mut() = vec![
            make_post(2, "ana", vec![comment(1, "bo", "agreed")]),
            make_post(1, "bo", vec![]),
        ];
        let mut store = ThreadStore::new(fake, session(), 1);
        store.load().unwrap();

        let text = thread(&store);
        assert!(text.contains("#2 ana (you)"));
        assert!(text.contains("> bo"));
        assert!(text.contains("agreed"));
        assert!(!text.contains("#1 bo (you)"));
    }

    #[test]
    fn group_detail_without_cover() {
        let detail = GroupDetail {
            group: Group {
                id: 1,
                name: "Winter Reads".into(),
                book: Some(1),
                book_title: "Dune".into(),
                creator_name: "ana".into(),
                start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2024, 1, 11).unwrap(),
                member_count: 0,
                is_full: false,
                members: Vec::new(),
            },
            book_info: Some(BookInfo {
                title: "Dune".into(),
                author: "Frank Herbert".into(),
                cover_url: None,
            }),
        };
        let base = Url::parse("http://localhost:8000/api/").unwrap();
        let text = group_detail(&detail, &base);
        assert!(text.contains("Dune by Frank Herbert"));
        assert!(text.contains("No cover available"));
        assert!(text.contains("Members (0)"));
    }
}
