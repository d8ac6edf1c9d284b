//! Askama template definitions.

use askama::Template;

/// A single article entry for the index listing
#[derive(Debug, Clone)]
pub struct ArticleEntry {
    pub url: String,
    pub title: String,
    pub date: String,
}

#[derive(Template)]
#[template(path = "post.html")]
pub struct PostTemplate {
    // Page metadata
    pub title: String,
    pub date: String,
    pub categories: Vec<String>,
    pub tags: Vec<String>,

    // Content (already rendered to HTML)
    pub content: String,

    // Site metadata
    pub site_title: String,
    pub site_author: String,
    pub year: i32,
    pub base_url: String,
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub site_title: String,
    pub site_description: String,
    pub site_author: String,
    pub year: i32,
    pub articles: Vec<ArticleEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_template_renders_metadata() {
        let page = PostTemplate {
            title: "Exploring PGO".into(),
            date: "October 22, 2023".into(),
            categories: vec!["go".into()],
            tags: vec!["go".into(), "performance".into()],
            content: "<p>Body.</p>".into(),
            site_title: "My Blog".into(),
            site_author: "Jane".into(),
            year: 2023,
            base_url: "/".into(),
        };

        let html = page.render().unwrap();
        assert!(html.contains("Exploring PGO"));
        assert!(html.contains("October 22, 2023"));
        assert!(html.contains("<p>Body.</p>"));
        assert!(html.contains("performance"));
        assert!(html.contains("© 2023 Jane"));
    }

    #[test]
    fn test_post_template_escapes_title() {
        let page = PostTemplate {
            title: "a < b".into(),
            date: String::new(),
            categories: vec![],
            tags: vec![],
            content: String::new(),
            site_title: "T".into(),
            site_author: "A".into(),
            year: 2024,
            base_url: "/".into(),
        };

        let html = page.render().unwrap();
        assert!(html.contains("a &lt; b"));
    }

    #[test]
    fn test_index_template_lists_articles() {
        let page = IndexTemplate {
            site_title: "My Blog".into(),
            site_description: "Notes".into(),
            site_author: "Jane".into(),
            year: 2024,
            articles: vec![
                ArticleEntry {
                    url: "/go-pgo.html".into(),
                    title: "Exploring PGO".into(),
                    date: "2023-10-22".into(),
                },
                ArticleEntry {
                    url: "/hello.html".into(),
                    title: "Hello".into(),
                    date: "2022-01-01".into(),
                },
            ],
        };

        let html = page.render().unwrap();
        let first = html.find("go-pgo").unwrap();
        let second = html.find("hello.html").unwrap();
        assert!(first < second);
    }
}
