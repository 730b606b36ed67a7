use std::ops::Range;

use regex::{Regex, RegexBuilder};

use crate::model::Task;

/// A task whose title matched the search pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub task_id: String,
    pub spans: Vec<Range<usize>>,
}

/// Compile a case-insensitive search pattern. Input that is not a valid
/// regex is searched for literally.
pub fn build_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let build = |p: &str| RegexBuilder::new(p).case_insensitive(true).build();
    build(pattern).or_else(|_| build(&regex::escape(pattern)))
}

/// Collect all non-overlapping match byte-ranges for a regex in the given text.
pub fn find_matches(re: &Regex, text: &str) -> Vec<Range<usize>> {
    re.find_iter(text)
        .filter(|m| !m.is_empty())
        .map(|m| m.start()..m.end())
        .collect()
}

/// Title matches in feed order
pub fn search_titles<'a, I>(tasks: I, re: &Regex) -> Vec<SearchHit>
where
    I: IntoIterator<Item = &'a Task>,
{
    tasks
        .into_iter()
        .filter_map(|task| {
            let spans = find_matches(re, &task.title);
            (!spans.is_empty()).then(|| SearchHit {
                task_id: task.id.clone(),
                spans,
            })
        })
        .collect()
}
