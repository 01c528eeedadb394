//! Goal-directed planning by backward chaining over type tags.
//!
//! The planner starts from the goal type and works backwards: every type that
//! is needed and not already covered by the initial input or a selected action
//! is resolved by picking one action that produces it, whose own inputs then
//! become needed. The selected actions are finally ordered so that producers
//! run before their consumers.
//!
//! # Tie-break policy
//!
//! When several actions can produce a needed type, only the *viable* ones are
//! considered (all of their inputs can be materialized from the initial input).
//! Among those:
//! - for the goal type, the single action marked as achieving the goal wins;
//!   several marked actions, or several unmarked ones with no marked action, is
//!   an [`AmbiguousGoal`](PlanningError::AmbiguousGoal) error rather than a guess;
//! - for every other type, the most recently registered action wins, unless
//!   it could only run by first producing a type that is waiting on it; then
//!   the next most recent one is tried.
//!
//! Among actions that are ready to run at the same point, the earlier declared
//! one is ordered first. Planning is a pure function of its inputs.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use crate::core::action::descriptor::ActionDescriptor;
use crate::core::action::store::ActionStore;
use crate::core::TypeTag;
use crate::error::PlanningError;

/// An ordered sequence of actions leading from the initial input to the goal.
///
/// Every action's inputs are available when it runs, no action appears twice,
/// and the last action is the one producing the goal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    initial: TypeTag,
    goal: TypeTag,
    steps: Vec<ActionDescriptor>,
}

impl Plan {
    pub fn initial(&self) -> &TypeTag {
        &self.initial
    }

    pub fn goal(&self) -> &TypeTag {
        &self.goal
    }

    pub fn steps(&self) -> &[ActionDescriptor] {
        &self.steps
    }

    pub fn action_names(&self) -> Vec<&str> {
        self.steps.iter().map(|d| d.name.as_str()).collect()
    }

    /// The action producing the goal, which is always the last step.
    pub fn goal_action(&self) -> Option<&ActionDescriptor> {
        self.steps.last()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} => [{}] => {}", self.initial, self.action_names().join(" -> "), self.goal)
    }
}

/// Computes a plan producing `goal` from a value of type `initial`.
pub fn plan(initial: &TypeTag, goal: &TypeTag, store: &ActionStore) -> Result<Plan, PlanningError> {
    log::debug!("Planning goal '{}' from '{}' over {} actions", goal, initial, store.len());

    let descriptors: Vec<&ActionDescriptor> = store.descriptors().collect();
    let reachable = materializable(initial, &descriptors);

    let goal_candidates = viable_producers(goal, &descriptors, &reachable);
    if goal_candidates.is_empty() {
        return Err(unreachable(goal, goal, &descriptors, &reachable));
    }
    let goal_index = choose_goal_producer(goal, &goal_candidates, &descriptors)?;

    let mut search = Search {
        initial,
        descriptors: &descriptors,
        reachable: &reachable,
        selected: HashMap::new(),
        trail: Vec::new(),
    };
    if let Err(blocked) = search.try_producer(goal, goal_index, &mut Vec::new()) {
        log::debug!(
            "Every way of producing '{}' for '{}' needs the goal itself",
            blocked,
            descriptors[goal_index].name
        );
        return Err(PlanningError::UnreachableGoal {
            goal: goal.clone(),
            missing: blocked,
        });
    }
    let selected = search.selected;

    let order = order_by_dependencies(initial, goal, &selected, &descriptors)?;
    let plan = Plan {
        initial: initial.clone(),
        goal: goal.clone(),
        steps: order.into_iter().map(|i| descriptors[i].clone()).collect(),
    };
    debug_assert_eq!(plan.goal_action().map(|d| &d.output), Some(goal));

    log::info!("Planned {}", plan);
    Ok(plan)
}

/// Forward fix-point: every type that can be produced starting from `initial`.
fn materializable(initial: &TypeTag, descriptors: &[&ActionDescriptor]) -> HashSet<TypeTag> {
    let mut available = HashSet::from([initial.clone()]);
    loop {
        let mut changed = false;
        for d in descriptors {
            if !available.contains(&d.output) && d.inputs.iter().all(|i| available.contains(i)) {
                available.insert(d.output.clone());
                changed = true;
            }
        }
        if !changed {
            return available;
        }
    }
}

/// Indices of the actions producing `tag` whose inputs can all be materialized.
fn viable_producers(
    tag: &TypeTag,
    descriptors: &[&ActionDescriptor],
    reachable: &HashSet<TypeTag>,
) -> Vec<usize> {
    descriptors
        .iter()
        .enumerate()
        .filter(|(_, d)| &d.output == tag && d.inputs.iter().all(|i| reachable.contains(i)))
        .map(|(i, _)| i)
        .collect()
}

/// Depth-first selection of one producer per needed type.
///
/// Candidates are tried most recently registered first. A candidate whose
/// inputs lead back to a type still being resolved on the current path is
/// abandoned, together with everything selected while trying it, and the next
/// candidate is tried instead.
struct Search<'a> {
    initial: &'a TypeTag,
    descriptors: &'a [&'a ActionDescriptor],
    reachable: &'a HashSet<TypeTag>,
    // needed type -> index of the action selected to produce it
    selected: HashMap<TypeTag, usize>,
    // selection order, for rolling back abandoned candidates
    trail: Vec<TypeTag>,
}

impl Search<'_> {
    /// Makes `needed` available, or returns the type that could not be produced.
    fn resolve(&mut self, needed: &TypeTag, path: &mut Vec<TypeTag>) -> Result<(), TypeTag> {
        if needed == self.initial || self.selected.contains_key(needed) {
            return Ok(());
        }
        if path.contains(needed) {
            return Err(needed.clone());
        }

        let candidates = viable_producers(needed, self.descriptors, self.reachable);
        for &candidate in candidates.iter().rev() {
            if self.try_producer(needed, candidate, path).is_ok() {
                if candidates.len() > 1 {
                    log::debug!(
                        "{} actions produce '{}', chose '{}'",
                        candidates.len(),
                        needed,
                        self.descriptors[candidate].name
                    );
                }
                return Ok(());
            }
            log::trace!(
                "'{}' cannot produce '{}' without a cycle",
                self.descriptors[candidate].name,
                needed
            );
        }
        Err(needed.clone())
    }

    fn try_producer(
        &mut self,
        produced: &TypeTag,
        candidate: usize,
        path: &mut Vec<TypeTag>,
    ) -> Result<(), TypeTag> {
        let mark = self.trail.len();
        path.push(produced.clone());
        let descriptors = self.descriptors;
        let result = descriptors[candidate]
            .inputs
            .iter()
            .try_for_each(|input| self.resolve(input, path));
        path.pop();

        match result {
            Ok(()) => {
                self.selected.insert(produced.clone(), candidate);
                self.trail.push(produced.clone());
                Ok(())
            }
            Err(blocked) => {
                for tag in self.trail.drain(mark..) {
                    self.selected.remove(&tag);
                }
                Err(blocked)
            }
        }
    }
}

fn choose_goal_producer(
    goal: &TypeTag,
    candidates: &[usize],
    descriptors: &[&ActionDescriptor],
) -> Result<usize, PlanningError> {
    let marked: Vec<usize> = candidates
        .iter()
        .copied()
        .filter(|&i| descriptors[i].achieves_goal)
        .collect();

    let ambiguous = |indices: &[usize]| PlanningError::AmbiguousGoal {
        goal: goal.clone(),
        candidates: indices.iter().map(|&i| descriptors[i].name.clone()).collect(),
    };

    match (marked.as_slice(), candidates) {
        ([only], _) => Ok(*only),
        ([], [only]) => Ok(*only),
        ([], all) => Err(ambiguous(all)),
        (several, _) => Err(ambiguous(several)),
    }
}

/// Walks back from `needed` to the most specific type nothing can produce.
fn unreachable(
    goal: &TypeTag,
    needed: &TypeTag,
    descriptors: &[&ActionDescriptor],
    reachable: &HashSet<TypeTag>,
) -> PlanningError {
    let mut visited = HashSet::from([needed.clone()]);
    let mut missing = needed.clone();
    'descend: loop {
        let current = missing.clone();
        for d in descriptors.iter().filter(|d| d.output == current) {
            if let Some(input) = d
                .inputs
                .iter()
                .find(|i| !reachable.contains(*i) && !visited.contains(*i))
            {
                visited.insert(input.clone());
                missing = input.clone();
                continue 'descend;
            }
        }
        break;
    }

    log::debug!("Goal '{}' is unreachable, nothing produces '{}'", goal, missing);
    PlanningError::UnreachableGoal {
        goal: goal.clone(),
        missing,
    }
}

/// Kahn's algorithm over the selected actions, earliest declared first among ready ones.
fn order_by_dependencies(
    initial: &TypeTag,
    goal: &TypeTag,
    selected: &HashMap<TypeTag, usize>,
    descriptors: &[&ActionDescriptor],
) -> Result<Vec<usize>, PlanningError> {
    let nodes: BTreeSet<usize> = selected.values().copied().collect();

    let mut pending: HashMap<usize, BTreeSet<usize>> = HashMap::new();
    for &node in &nodes {
        let deps = descriptors[node]
            .inputs
            .iter()
            .filter(|t| *t != initial)
            .filter_map(|t| selected.get(t).copied())
            .collect();
        pending.insert(node, deps);
    }

    let mut order = Vec::with_capacity(nodes.len());
    let mut ready: BTreeSet<usize> = nodes
        .iter()
        .copied()
        .filter(|n| pending.get(n).is_some_and(BTreeSet::is_empty))
        .collect();

    while let Some(next) = ready.pop_first() {
        order.push(next);
        pending.remove(&next);
        for (&node, deps) in pending.iter_mut() {
            if deps.remove(&next) && deps.is_empty() {
                ready.insert(node);
            }
        }
    }

    if let Some(&stuck) = pending.keys().min() {
        log::debug!(
            "Type dependencies form a cycle through action '{}'",
            descriptors[stuck].name
        );
        return Err(PlanningError::UnreachableGoal {
            goal: goal.clone(),
            missing: descriptors[stuck].output.clone(),
        });
    }

    Ok(order)
}
