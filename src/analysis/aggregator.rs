//! Story aggregation and statistics.
//!
//! This module provides the pure roll-ups the reports are built from:
//! label weights, owner tallies and rankings, and state counts.

use crate::models::{OwnerWork, Story, StoryState};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Per-label weight. Each story's estimate is split evenly across its
/// labels; unlabeled stories contribute nothing.
pub fn label_weights<'a, I>(stories: I) -> HashMap<String, f64>
where
    I: IntoIterator<Item = &'a Story>,
{
    let mut weights: HashMap<String, f64> = HashMap::new();

    for story in stories {
        if story.labels.is_empty() {
            continue;
        }
        let share = f64::from(story.estimate) / story.labels.len() as f64;
        for label in &story.labels {
            *weights.entry(label.clone()).or_default() += share;
        }
    }

    weights
}

/// Labels ordered by weight, heaviest first; ties by label name.
pub fn top_labels<'a, I>(stories: I) -> Vec<(String, f64)>
where
    I: IntoIterator<Item = &'a Story>,
{
    let mut labels: Vec<(String, f64)> = label_weights(stories).into_iter().collect();

    labels.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });

    labels
}

/// Add one story to its owner's tally, creating the tally on first sight.
pub fn record_owner_work(owners: &mut HashMap<String, OwnerWork>, story: &Story) {
    owners
        .entry(story.owned_by.clone())
        .or_insert_with(|| OwnerWork::new(story.owned_by.clone()))
        .increment(story.estimate);
}

/// Tally every story by owner.
pub fn tally_owners<'a, I>(stories: I) -> HashMap<String, OwnerWork>
where
    I: IntoIterator<Item = &'a Story>,
{
    let mut owners = HashMap::new();
    for story in stories {
        record_owner_work(&mut owners, story);
    }
    owners
}

/// Owners by points, then by story count, both descending. Remaining ties
/// fall back to the owner name so output is stable across runs.
pub fn rank_owners<I>(owners: I) -> Vec<OwnerWork>
where
    I: IntoIterator<Item = OwnerWork>,
{
    let mut ranked: Vec<OwnerWork> = owners.into_iter().collect();

    ranked.sort_by(|a, b| {
        b.points_count
            .cmp(&a.points_count)
            .then_with(|| b.story_count.cmp(&a.story_count))
            .then_with(|| a.owner.cmp(&b.owner))
    });

    ranked
}

/// Number of stories in each state.
pub fn count_by_state<'a, I>(stories: I) -> BTreeMap<StoryState, usize>
where
    I: IntoIterator<Item = &'a Story>,
{
    let mut counts = BTreeMap::new();
    for story in stories {
        *counts.entry(story.current_state).or_default() += 1;
    }
    counts
}

/// Sum of estimates.
pub fn total_points<'a, I>(stories: I) -> u64
where
    I: IntoIterator<Item = &'a Story>,
{
    stories.into_iter().map(|s| u64::from(s.estimate)).sum()
}

/// Every distinct label, in the order first seen.
pub fn distinct_labels<'a, I>(stories: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Story>,
{
    let mut seen = HashSet::new();
    let mut labels = Vec::new();

    for label in stories.into_iter().flat_map(|s| &s.labels) {
        if seen.insert(label.as_str()) {
            labels.push(label.clone());
        }
    }

    labels
}

/// Stories grouped under their owner's name.
pub fn group_by_owner<I>(stories: I) -> BTreeMap<String, Vec<Story>>
where
    I: IntoIterator<Item = Story>,
{
    let mut grouped: BTreeMap<String, Vec<Story>> = BTreeMap::new();
    for story in stories {
        grouped.entry(story.owned_by.clone()).or_default().push(story);
    }
    grouped
}
