//! Corpus sources for ingestion: fabricated contest announcements for demos,
//! or `.txt` files from disk.

use std::path::Path;

use chrono::{Duration, Local};
use tracing::info;
use uuid::Uuid;

use crate::document::{Document, extract_title};
use crate::error::Result;
use crate::utils::{load_text_files, split_into_chunks};

struct ContestTemplate {
    name: &'static str,
    host: &'static str,
    field: &'static str,
    eligibility: &'static str,
    team_size: &'static str,
    prize: &'static str,
    preferred_major: &'static str,
    detail: &'static str,
}

const TEMPLATES: [ContestTemplate; 10] = [
    ContestTemplate {
        name: "AI 헬스케어 챌린지",
        host: "삼성전자",
        field: "AI/헬스케어",
        eligibility: "대학생, 일반인",
        team_size: "1~4명",
        prize: "대상 1,000만원, 우수상 500만원",
        preferred_major: "컴퓨터공학, 의학, 생명공학",
        detail: "딥러닝 기반 의료 영상 분석 기술을 활용한 질병 조기 진단 솔루션 개발",
    },
    ContestTemplate {
        name: "스마트시티 아이디어 공모전",
        host: "서울시",
        field: "도시계획/ICT",
        eligibility: "제한없음",
        team_size: "1~5명",
        prize: "대상 2,000만원, 최우수상 1,000만원",
        preferred_major: "도시공학, 건축학, IT",
        detail: "IoT와 빅데이터를 활용한 스마트시티 구축 아이디어 제안",
    },
    ContestTemplate {
        name: "친환경 패키징 디자인 공모전",
        host: "환경부",
        field: "디자인/환경",
        eligibility: "대학생",
        team_size: "1~3명",
        prize: "대상 500만원, 우수상 300만원",
        preferred_major: "산업디자인, 환경공학",
        detail: "재활용 가능한 친환경 소재를 활용한 혁신적인 패키징 디자인",
    },
    ContestTemplate {
        name: "핀테크 서비스 개발 공모전",
        host: "금융위원회",
        field: "핀테크/금융",
        eligibility: "일반인, 스타트업",
        team_size: "2~5명",
        prize: "대상 3,000만원, 우수상 1,500만원, 투자 연계",
        preferred_major: "경제학, 컴퓨터공학, 금융공학",
        detail: "블록체인, AI를 활용한 혁신적인 금융 서비스 개발",
    },
    ContestTemplate {
        name: "소셜벤처 창업 아이디어 경진대회",
        host: "중소벤처기업부",
        field: "사회혁신/창업",
        eligibility: "만 39세 이하",
        team_size: "1~4명",
        prize: "대상 1,500만원, 창업 지원금 5,000만원",
        preferred_major: "경영학, 사회학, 제한없음",
        detail: "사회문제 해결을 위한 지속가능한 비즈니스 모델 제안",
    },
    ContestTemplate {
        name: "메타버스 콘텐츠 크리에이터 공모전",
        host: "문화체육관광부",
        field: "메타버스/콘텐츠",
        eligibility: "대학생, 일반인",
        team_size: "1~6명",
        prize: "대상 2,000만원, 우수상 1,000만원",
        preferred_major: "게임개발, 3D디자인, 컴퓨터공학",
        detail: "메타버스 플랫폼에서 활용 가능한 창의적인 콘텐츠 제작",
    },
    ContestTemplate {
        name: "빅데이터 분석 경진대회",
        host: "한국데이터산업진흥원",
        field: "빅데이터/AI",
        eligibility: "대학생, 대학원생",
        team_size: "1~4명",
        prize: "대상 1,000만원, 우수상 500만원, 기업 인턴십",
        preferred_major: "통계학, 컴퓨터공학, 데이터사이언스",
        detail: "공공 빅데이터를 활용한 사회문제 해결 분석 모델 개발",
    },
    ContestTemplate {
        name: "모바일 앱 개발 챌린지",
        host: "네이버",
        field: "모바일/앱개발",
        eligibility: "대학생",
        team_size: "2~4명",
        prize: "대상 1,500만원, 우수상 700만원, 채용 연계",
        preferred_major: "컴퓨터공학, 소프트웨어공학",
        detail: "일상의 불편함을 해결하는 혁신적인 모바일 애플리케이션 개발",
    },
    ContestTemplate {
        name: "ESG 경영 아이디어 공모전",
        host: "대한상공회의소",
        field: "경영/지속가능성",
        eligibility: "대학생, 일반인",
        team_size: "1~3명",
        prize: "대상 800만원, 우수상 400만원",
        preferred_major: "경영학, 환경공학, 제한없음",
        detail: "기업의 환경·사회·지배구조 개선을 위한 실행 가능한 전략 제안",
    },
    ContestTemplate {
        name: "관광 마케팅 콘텐츠 공모전",
        host: "한국관광공사",
        field: "관광/마케팅",
        eligibility: "제한없음",
        team_size: "1~5명",
        prize: "대상 1,000만원, 우수상 500만원",
        preferred_major: "관광학, 마케팅, 미디어커뮤니케이션",
        detail: "한국 관광 활성화를 위한 창의적인 마케팅 콘텐츠 기획 및 제작",
    },
];

/// Fabricates `num_contests` announcements, cycling through the templates.
///
/// From the second cycle on, names get a round suffix (` 2회`, ` 3회`, ...).
/// Deadlines are random, 1 to 180 days from today.
pub fn build_corpus(num_contests: usize) -> Vec<Document> {
    (0..num_contests)
        .map(|i| {
            let template = &TEMPLATES[i % TEMPLATES.len()];
            let round = i / TEMPLATES.len() + 1;
            let name = if round > 1 {
                format!("{} {round}회", template.name)
            } else {
                template.name.to_string()
            };

            // v4 UUIDs are random bits; used here only as a source for 1..=180 days.
            let days_until = (Uuid::new_v4().as_u128() % 180) as i64 + 1;
            let deadline = (Local::now() + Duration::days(days_until)).format("%Y-%m-%d");

            let text = format!(
                "[공모전명]: {name}\n\
                 [주최]: {}\n\
                 [분야]: {}\n\
                 [참가 자격]: {}\n\
                 [팀 규모]: {}\n\
                 [마감일]: {deadline}\n\
                 [상금 및 혜택]: {}\n\
                 [전공 우대]: {}\n\
                 [상세 내용]: {}",
                template.host,
                template.field,
                template.eligibility,
                template.team_size,
                template.prize,
                template.preferred_major,
                template.detail,
            );

            let path = format!("contests/contest_{:03}.txt", i + 1);
            Document {
                id: format!("{path}::chunk_0000"),
                text,
                path,
                chunk: 0,
                title: Some(name),
            }
        })
        .collect()
}

/// Reads `.txt` files under `dir` into documents.
///
/// Files in the labelled announcement format stay whole; anything else is
/// split at sentence boundaries into chunks of roughly `max_chars`.
pub fn load_corpus_dir(dir: impl AsRef<Path>, max_chars: usize) -> Result<Vec<Document>> {
    let mut docs = Vec::new();

    for (relative, content) in load_text_files(dir.as_ref())? {
        let path = relative.to_string_lossy().replace('\\', "/");
        let content = content.trim();
        if content.is_empty() {
            continue;
        }

        let title = extract_title(content);
        let chunks = if title.is_some() {
            vec![content.to_string()]
        } else {
            split_into_chunks(content, max_chars)
        };

        for (chunk, text) in chunks.into_iter().enumerate() {
            docs.push(Document {
                id: format!("{path}::chunk_{chunk:04}"),
                text,
                path: path.clone(),
                chunk,
                title: title.clone(),
            });
        }
    }

    info!(target: "contest_rag::ingest", dir = %dir.as_ref().display(), docs = docs.len(), "corpus loaded");
    Ok(docs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn builds_requested_number_of_contests() {
        let corpus = build_corpus(23);
        assert_eq!(corpus.len(), 23);
        assert_eq!(corpus[0].id, "contests/contest_001.txt::chunk_0000");
        assert_eq!(corpus[22].path, "contests/contest_023.txt");
        assert!(corpus.iter().all(|d| d.chunk == 0));
    }

    #[test]
    fn later_cycles_get_round_suffix() {
        let corpus = build_corpus(21);
        assert_eq!(corpus[0].title.as_deref(), Some("AI 헬스케어 챌린지"));
        assert_eq!(corpus[10].title.as_deref(), Some("AI 헬스케어 챌린지 2회"));
        assert_eq!(corpus[20].title.as_deref(), Some("AI 헬스케어 챌린지 3회"));
    }

    #[test]
    fn text_uses_labelled_format() {
        let doc = &build_corpus(1)[0];
        let lines: Vec<&str> = doc.text.lines().collect();
        assert_eq!(lines.len(), 9);
        assert_eq!(lines[0], "[공모전명]: AI 헬스케어 챌린지");
        assert!(lines[5].starts_with("[마감일]: "));
        assert_eq!(extract_title(&doc.text), doc.title);
    }

    #[test]
    fn loads_and_chunks_plain_files() -> Result<()> {
        let dir = tempdir()?;
        fs::write(
            dir.path().join("notice.txt"),
            "First sentence here. Second sentence here. Third one.",
        )?;
        fs::write(dir.path().join("contest.txt"), "[공모전명]: Foo\n[주최]: Bar")?;

        let docs = load_corpus_dir(dir.path(), 25)?;
        let contest: Vec<_> = docs.iter().filter(|d| d.path == "contest.txt").collect();
        assert_eq!(contest.len(), 1);
        assert_eq!(contest[0].title.as_deref(), Some("Foo"));

        let notice: Vec<_> = docs.iter().filter(|d| d.path == "notice.txt").collect();
        assert!(notice.len() > 1);
        assert_eq!(notice[1].id, "notice.txt::chunk_0001");
        assert!(notice.iter().all(|d| d.title.is_none()));
        Ok(())
    }
}
