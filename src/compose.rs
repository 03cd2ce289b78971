//! Extractive recommendation summary built from the best hits.

use crate::document::ContextItem;

/// Entries listed in a drafted answer.
pub const MAX_ENTRIES: usize = 3;

/// Drafts the answer for `query`; empty when there is nothing to summarise.
///
/// Each listed hit costs its title length (in characters) against
/// `max_context`. The entry that exhausts the budget is still listed; the ones
/// after it are dropped. Titles themselves are never cut.
pub fn draft_answer(query: &str, contexts: &[ContextItem], max_context: usize) -> String {
    if contexts.is_empty() {
        return String::new();
    }

    let mut budget = i64::try_from(max_context).unwrap_or(i64::MAX);
    let mut entries = Vec::with_capacity(MAX_ENTRIES);

    for (ordinal, item) in (1..).zip(contexts.iter().take(MAX_ENTRIES)) {
        let title = item
            .document
            .title_or_extract()
            .unwrap_or_else(|| format!("Document #{ordinal}"));

        entries.push(format!(
            "{ordinal}. {title} (매칭도: {:.1}%)",
            item.score * 100.0
        ));

        budget -= title.chars().count() as i64;
        if budget <= 0 {
            break;
        }
    }

    format!(
        "'{query}' 검색 결과 {}개 공모전을 찾았습니다.\n\n추천 공모전:\n{}",
        contexts.len(),
        entries.join("\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    fn item(text: &str, score: f32) -> ContextItem {
        ContextItem {
            document: Document::new("id", text),
            score,
        }
    }

    fn entry_count(answer: &str) -> usize {
        answer
            .lines()
            .filter(|line| line.contains("(매칭도: "))
            .count()
    }

    #[test]
    fn empty_contexts_give_empty_answer() {
        assert_eq!(draft_answer("anything", &[], 1500), "");
    }

    #[test]
    fn header_carries_query_and_total_count() {
        let contexts = vec![item("[공모전명]: A", 0.9), item("[공모전명]: B", 0.8)];
        let answer = draft_answer("헬스케어 공모전", &contexts, 1500);
        assert!(answer.starts_with("'헬스케어 공모전' 검색 결과 2개 공모전을 찾았습니다."));
        assert!(answer.contains("1. A (매칭도: 90.0%)"));
        assert!(answer.contains("2. B (매칭도: 80.0%)"));
    }

    #[test]
    fn never_lists_more_than_three() {
        let contexts: Vec<_> = (0..7)
            .map(|i| item(&format!("[공모전명]: Contest {i}"), 0.5))
            .collect();
        let answer = draft_answer("q", &contexts, 10_000);
        assert_eq!(entry_count(&answer), MAX_ENTRIES);
        assert!(answer.contains("7개"));
        assert!(!answer.contains("4. "));
    }

    #[test]
    fn falls_back_to_ordinal_placeholder() {
        let contexts = vec![item("[공모전명]: Foo", 0.7), item("no marker here", 0.6)];
        let answer = draft_answer("q", &contexts, 1500);
        assert!(answer.contains("1. Foo (매칭도: 70.0%)"));
        assert!(answer.contains("2. Document #2 (매칭도: 60.0%)"));
    }

    #[test]
    fn structured_title_is_preferred() {
        let mut ctx = item("[공모전명]: Legacy", 0.5);
        ctx.document.title = Some("Structured".into());
        let answer = draft_answer("q", &[ctx], 1500);
        assert!(answer.contains("1. Structured"));
    }

    #[test]
    fn exhausted_budget_truncates_entry_list() {
        let contexts = vec![
            item("[공모전명]: 12345", 0.9),
            item("[공모전명]: 67890", 0.8),
            item("[공모전명]: abcde", 0.7),
        ];
        // 5 + 5 = 10 exhausts the budget after the second entry.
        let answer = draft_answer("q", &contexts, 10);
        assert_eq!(entry_count(&answer), 2);

        let answer = draft_answer("q", &contexts, 0);
        assert_eq!(entry_count(&answer), 1);
        assert!(answer.contains("3개"));
    }

    #[test]
    fn budget_counts_characters_not_bytes() {
        let contexts = vec![
            item("[공모전명]: 헬스케어", 0.9),
            item("[공모전명]: 스마트시티", 0.8),
            item("[공모전명]: 관광", 0.7),
        ];
        // 4 + 5 = 9 characters, well under a 10 budget even though the bytes are not.
        let answer = draft_answer("q", &contexts, 10);
        assert_eq!(entry_count(&answer), 3);
    }

    #[test]
    fn long_titles_are_not_cut() {
        let title = "가".repeat(200);
        let answer = draft_answer("q", &[item(&format!("[공모전명]: {title}"), 0.5)], 5);
        assert!(answer.contains(&title));
    }
}
