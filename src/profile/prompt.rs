//! Prompt assembly for profile questions.

// std
use std::fmt::Write;
// self
use crate::profile::ProfileData;

const MAX_ITEMS: usize = 50;
const POST_BODY_CHARS: usize = 200;
const COMMENT_BODY_CHARS: usize = 150;
const CLOSING: &str = "Please provide a helpful analysis based on the available data. Be specific and reference actual posts/comments when relevant.";

/// Builds the single-turn prompt sent to the provider for `question` about `user`.
///
/// At most 50 posts and 50 comments are listed; bodies are truncated to 200 and 150 characters.
pub fn build_prompt(user: &str, data: &ProfileData, question: &str) -> String {
	let mut prompt = format!("You are analyzing the Reddit profile of user \"u/{user}\". ");

	if let Some(posts) = data.posts.as_deref().filter(|posts| !posts.is_empty()) {
		let _ = write!(prompt, "\n\nPOSTS ({} total):\n", posts.len());

		for (index, post) in posts.iter().take(MAX_ITEMS).enumerate() {
			let _ = writeln!(
				prompt,
				"{}. [{}] \"{}\" ({} points)",
				index + 1,
				post.subreddit,
				post.title,
				post.score
			);

			if let Some(body) = post.body.as_deref().filter(|body| !body.is_empty()) {
				let _ = writeln!(prompt, "   Body: {}", truncate(body, POST_BODY_CHARS));
			}
		}

		if posts.len() > MAX_ITEMS {
			let _ = writeln!(prompt, "... and {} more posts", posts.len() - MAX_ITEMS);
		}
	}
	if let Some(comments) = data.comments.as_deref().filter(|comments| !comments.is_empty()) {
		let _ = write!(prompt, "\n\nCOMMENTS ({} total):\n", comments.len());

		for (index, comment) in comments.iter().take(MAX_ITEMS).enumerate() {
			let _ = writeln!(
				prompt,
				"{}. [{}] {} ({} points)",
				index + 1,
				comment.subreddit,
				truncate(&comment.body, COMMENT_BODY_CHARS),
				comment.score
			);
		}

		if comments.len() > MAX_ITEMS {
			let _ = writeln!(prompt, "... and {} more comments", comments.len() - MAX_ITEMS);
		}
	}

	let _ = write!(prompt, "\n\nUser Question: {question}\n\n{CLOSING}");

	prompt
}

fn truncate(text: &str, max_chars: usize) -> String {
	match text.char_indices().nth(max_chars) {
		Some((cut, _)) => format!("{}...", &text[..cut]),
		None => text.to_owned(),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::profile::{Comment, Post};

	#[test]
	fn prompt_lists_posts_and_comments() {
		let data = ProfileData {
			posts: Some(vec![Post {
				title: "Hello".into(),
				subreddit: "rust".into(),
				score: 12,
				body: Some("Body text".into()),
			}]),
			comments: Some(vec![Comment {
				subreddit: "golang".into(),
				body: "Nice".into(),
				score: -2,
			}]),
			..ProfileData::default()
		};
		let prompt = build_prompt("alice", &data, "What do they like?");

		assert_eq!(
			prompt,
			"You are analyzing the Reddit profile of user \"u/alice\". \n\nPOSTS (1 total):\n1. [rust] \"Hello\" (12 points)\n   Body: Body text\n\n\nCOMMENTS (1 total):\n1. [golang] Nice (-2 points)\n\n\nUser Question: What do they like?\n\nPlease provide a helpful analysis based on the available data. Be specific and reference actual posts/comments when relevant."
		);
	}

	#[test]
	fn prompt_caps_items_and_truncates_bodies() {
		let posts = (0..53)
			.map(|i| Post {
				title: format!("t{i}"),
				subreddit: "s".into(),
				score: i,
				body: Some("é".repeat(250)),
			})
			.collect();
		let comments = (0..51)
			.map(|i| Comment { subreddit: "s".into(), body: "x".repeat(150), score: i })
			.collect();
		let data =
			ProfileData { posts: Some(posts), comments: Some(comments), ..ProfileData::default() };
		let prompt = build_prompt("bob", &data, "q");

		assert!(prompt.contains("POSTS (53 total)"));
		assert!(prompt.contains("50. [s] \"t49\" (49 points)"));
		assert!(!prompt.contains("\"t50\""));
		assert!(prompt.contains("... and 3 more posts\n"));
		assert!(prompt.contains(&format!("   Body: {}...\n", "é".repeat(200))));
		assert!(prompt.contains(&format!("1. [s] {} (0 points)", "x".repeat(150))));
		assert!(prompt.contains("... and 1 more comments\n"));
	}

	#[test]
	fn empty_sections_are_omitted() {
		let data = ProfileData { posts: Some(Vec::new()), ..ProfileData::default() };
		let prompt = build_prompt("carol", &data, "q");

		assert!(!prompt.contains("POSTS"));
		assert!(!prompt.contains("COMMENTS"));
	}
}
