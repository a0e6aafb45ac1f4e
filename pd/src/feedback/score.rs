//! Feedback score

/// Score a cycle from its side effects, in [0, 100]
///
/// `10*min(repos,4) + 5*min(commits,6) + 5*min(detected,4)`, plus 10 when the
/// cycle is completing.
pub fn feedback_score(repositories_created: usize, commits: u32, detected: u32, completing: bool) -> u8 {
    let repos = repositories_created.min(4) as u32;
    let score = 10 * repos + 5 * commits.min(6) + 5 * detected.min(4) + if completing { 10 } else { 0 };
    score.min(100) as u8
}
