//! Static checks on how a pipeline's context keys are wired.

use super::Node;
use crate::error::{Result, VidmetaError};
use crate::template::required_keys;
use std::collections::HashSet;

/// Check that `root` can run given the `seeded` context keys.
///
/// - every required placeholder of an agent is produced before that agent runs
///   (earlier in its sequence, by a completed parallel stage, or seeded);
/// - parallel branches publish disjoint keys;
/// - agent names are unique.
///
/// All problems are reported together.
pub fn validate<'a>(root: &Node, seeded: impl IntoIterator<Item = &'a str>) -> Result<()> {
    let mut available: HashSet<String> = seeded.into_iter().map(str::to_string).collect();
    let mut names = HashSet::new();
    let mut problems = Vec::new();

    check(root, &mut available, &mut names, &mut problems);

    if problems.is_empty() {
        Ok(())
    } else {
        Err(VidmetaError::Wiring(problems))
    }
}

fn check(
    node: &Node,
    available: &mut HashSet<String>,
    names: &mut HashSet<String>,
    problems: &mut Vec<String>,
) {
    if !names.insert(node.name().to_string()) {
        problems.push(format!("name '{}' is used more than once", node.name()));
    }

    match node {
        Node::Agent(agent) => {
            for key in required_keys(agent.instruction()) {
                if !available.contains(&key) {
                    problems.push(format!(
                        "agent '{}' reads '{{{}}}' before any earlier step publishes it",
                        agent.name(),
                        key
                    ));
                }
            }
            available.insert(agent.output_key().to_string());
        }
        Node::Sequential { children, .. } => {
            for child in children {
                check(child, available, names, problems);
            }
        }
        Node::Parallel { name, children } => {
            // Siblings only see what existed before the stage started.
            let before = available.clone();
            let mut published: Vec<(String, Vec<String>)> = Vec::new();

            for child in children {
                let mut branch_available = before.clone();
                check(child, &mut branch_available, names, problems);
                published.push((child.name().to_string(), child.output_keys()));
            }

            for (i, (first, first_keys)) in published.iter().enumerate() {
                for (second, second_keys) in &published[i + 1..] {
                    for key in first_keys.iter().filter(|k| second_keys.contains(k)) {
                        problems.push(format!(
                            "parallel stage '{}': branches '{}' and '{}' both publish '{}'",
                            name, first, second, key
                        ));
                    }
                }
                available.extend(first_keys.iter().cloned());
            }
        }
    }
}
