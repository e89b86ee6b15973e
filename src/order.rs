//! Total orders over posts and tags, and the single [`sort`] that applies
//! them. Nothing upstream of rendering is assumed to be sorted; every listing
//! is sorted here immediately before it is turned into a page.

use crate::graph::Tag;
use crate::post::Post;
use chrono::Datelike;
use std::cmp::Ordering;

/// Sorts `items` with `order`, comparing whatever each item refers to
/// (posts, `&Post`s, [`crate::graph::PostRef`]s, tags). The sort is stable,
/// so sorting twice changes nothing.
pub fn sort<T, U, F>(items: &mut [T], order: F)
where
    T: AsRef<U>,
    U: ?Sized,
    F: Fn(&U, &U) -> Ordering,
{
    items.sort_by(|a, b| order(a.as_ref(), b.as_ref()));
}

/// Newest first. Equal timestamps fall back to [`title_ascending`] and then
/// the slug, so the result never depends on discovery order.
pub fn date_descending(a: &Post, b: &Post) -> Ordering {
    b.date
        .cmp(&a.date)
        .then_with(|| title_ascending(a, b))
        .then_with(|| a.path.slug.cmp(&b.path.slug))
}

/// Alphabetical by title.
pub fn title_ascending(a: &Post, b: &Post) -> Ordering {
    a.title.cmp(&b.title)
}

/// Alphabetical by name, ignoring case.
pub fn name_ascending(a: &Tag, b: &Tag) -> Ordering {
    a.key().cmp(b.key()).then_with(|| a.name().cmp(b.name()))
}

/// Splits `posts` into runs by publish year, assuming they are already
/// sorted by [`date_descending`]. Years come out most recent first.
pub fn group_by_year<T>(posts: Vec<T>) -> Vec<(i32, Vec<T>)>
where
    T: AsRef<Post>,
{
    let mut years: Vec<(i32, Vec<T>)> = Vec::new();
    for post in posts {
        let year = post.as_ref().date.year();
        match years.last_mut() {
            Some((last, group)) if *last == year => {
                group.push(post);
                continue;
            }
            _ => {}
        }
        years.push((year, vec![post]));
    }
    years
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::Defaults;
    use crate::slug::Layout;
    use std::path::Path;

    fn post(title: &str, postdate: &str) -> Post {
        let input = format!("title: {}\npostdate: {}\n$endmeta\n", title, postdate);
        Post::parse(Path::new(title), &input, &Defaults::default(), Layout::Flat).unwrap()
    }

    fn posts() -> Vec<Post> {
        vec![
            post("b", "2019-12-31 10:00 UTC"),
            post("c", "2020-06-01 10:00 UTC"),
            post("a", "2020-01-01 10:00 UTC"),
            post("d", "2020-01-01 10:00 UTC"),
        ]
    }

    fn titles<'a>(posts: &[&'a Post]) -> Vec<&'a str> {
        posts.iter().map(|p| p.title.as_str()).collect()
    }

    #[test]
    fn test_date_descending() {
        let posts = posts();
        let mut refs: Vec<&Post> = posts.iter().rev().collect();
        sort(&mut refs, date_descending);

        assert_eq!(titles(&refs), vec!["c", "a", "d", "b"]);
        for pair in refs.windows(2) {
            assert!(pair[0].date >= pair[1].date);
        }

        let once = titles(&refs).join(",");
        sort(&mut refs, date_descending);
        assert_eq!(titles(&refs).join(","), once);
    }

    #[test]
    fn test_title_ascending() {
        let mut posts = posts();
        sort(&mut posts, title_ascending);
        let titles: Vec<&str> = posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_name_ascending() {
        let mut tags = vec![Tag::new("rust"), Tag::new("Go"), Tag::new("ada"), Tag::new("C")];
        sort(&mut tags, name_ascending);
        let names: Vec<&str> = tags.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["ada", "C", "Go", "rust"]);
    }

    #[test]
    fn test_group_by_year() {
        let posts = posts();
        let mut refs: Vec<&Post> = posts.iter().collect();
        sort(&mut refs, date_descending);

        let years = group_by_year(refs);
        let shape: Vec<(i32, Vec<&str>)> = years
            .iter()
            .map(|(year, posts)| (*year, titles(posts)))
            .collect();
        assert_eq!(shape, vec![(2020, vec!["c", "a", "d"]), (2019, vec!["b"])]);
    }
}
