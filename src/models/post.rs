//! Vacancy post data structure.

use std::fmt;

use chrono::NaiveDateTime;

use crate::utils::normalize_whitespace;

/// A vacancy crawled from a listing page.
///
/// `id` is assigned by the store on insert; freshly crawled posts carry
/// `None`. Equality covers `id`, `title`, `link` and `description` only,
/// so the same vacancy crawled at two different moments compares equal
/// until the store gives the copies distinct ids.
#[derive(Debug, Clone)]
pub struct Post {
    /// Store-assigned identity
    pub id: Option<i32>,

    /// Vacancy title
    pub title: String,

    /// Absolute URL of the vacancy detail page
    pub link: String,

    /// Full text of the detail page description
    pub description: String,

    /// Creation time as shown by the source, offset discarded
    pub created: NaiveDateTime,
}

impl Post {
    /// Create a post that has not been persisted yet.
    pub fn new(
        title: impl Into<String>,
        link: impl Into<String>,
        description: impl Into<String>,
        created: NaiveDateTime,
    ) -> Self {
        Self {
            id: None,
            title: title.into(),
            link: link.into(),
            description: description.into(),
            created,
        }
    }

    /// Return a copy of this post carrying the given store id.
    pub fn with_id(mut self, id: i32) -> Self {
        self.id = Some(id);
        self
    }
}

impl PartialEq for Post {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.title == other.title
            && self.link == other.link
            && self.description == other.description
    }
}

impl Eq for Post {}

impl std::hash::Hash for Post {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.title.hash(state);
        self.link.hash(state);
        self.description.hash(state);
    }
}

/// Single-line rendering used by the bulk read responder and the CLI.
///
/// Line breaks stored in the text fields are folded into spaces.
impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = self.id.map_or_else(|| "-".to_string(), |id| id.to_string());
        write!(
            f,
            "#{} | {} | {} | {} | {}",
            id,
            self.created.format("%Y-%m-%d %H:%M:%S"),
            normalize_whitespace(&self.title),
            self.link,
            normalize_whitespace(&self.description)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2022, 5, 19)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn sample_post() -> Post {
        Post::new(
            "Java Developer",
            "https://career.habr.com/vacancies/1000103713",
            "Чем предстоит заниматься",
            at(10),
        )
    }

    #[test]
    fn test_equality_ignores_created() {
        let mut other = sample_post();
        other.created = at(18);
        assert_eq!(sample_post(), other);
    }

    #[test]
    fn test_equality_respects_id() {
        let saved = sample_post().with_id(1);
        assert_ne!(saved, sample_post());
        assert_ne!(saved, sample_post().with_id(2));
        assert_eq!(saved, sample_post().with_id(1));
    }

    #[test]
    fn test_equality_respects_content() {
        let mut other = sample_post();
        other.description.push_str(" и не только");
        assert_ne!(sample_post(), other);
    }

    #[test]
    fn test_display_is_single_line() {
        let line = sample_post().with_id(7).to_string();
        assert_eq!(
            line,
            "#7 | 2022-05-19 10:00:00 | Java Developer | \
             https://career.habr.com/vacancies/1000103713 | Чем предстоит заниматься"
        );
        assert!(!line.contains('\n'));
    }

    #[test]
    fn test_display_folds_multiline_text() {
        let mut post = sample_post().with_id(3);
        post.title = "Java\nDeveloper".to_string();
        post.description = "Требования:\r\n- Java 17\n\n- Spring".to_string();

        let line = post.to_string();

        assert!(!line.contains('\n'));
        assert!(!line.contains('\r'));
        assert!(line.ends_with("| Java Developer | https://career.habr.com/vacancies/1000103713 | Требования: - Java 17 - Spring"));
    }

    #[test]
    fn test_display_without_id() {
        assert!(sample_post().to_string().starts_with("#- | "));
    }
}
