use crate::components::InputsMode;
use crate::{Fragment, PlanResult, QueryUniverses};
use itertools::Itertools;
use rdf_federation_common::BitSet;
use rustc_hash::FxHashMap;

/// Merges fragments with the same join interface into a single union.
///
/// Fragments have the same join interface if they match the same triples and, if inputs are
/// considered, require the same inputs. Without inputs, fragments that are
/// [equivalent](Fragment::is_equivalent) to an earlier fragment of their group are dropped.
///
/// The groups keep the order in which they first appear in `fragments`, and the members of a
/// union are ordered by their rendering. Grouping grouped fragments returns them unchanged.
pub fn group_fragments(
    universes: &QueryUniverses,
    fragments: &[Fragment],
    mode: InputsMode,
) -> PlanResult<Vec<Fragment>> {
    let mut groups: Vec<Vec<Fragment>> = Vec::new();
    let mut group_of_key: FxHashMap<(BitSet, Option<BitSet>), usize> = FxHashMap::default();

    for fragment in fragments {
        let triples = universes.triples().subset(fragment.triples())?;
        let inputs = match mode {
            InputsMode::NoInputs => None,
            InputsMode::WithInputs => Some(universes.variables().subset(fragment.input_vars())?),
        };

        let group = *group_of_key.entry((triples, inputs)).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        let members = &mut groups[group];

        let is_duplicate = members.iter().any(|member| {
            member == fragment || (mode == InputsMode::NoInputs && member.is_equivalent(fragment))
        });
        if !is_duplicate {
            members.push(fragment.clone());
        }
    }

    Ok(groups
        .into_iter()
        .map(|mut members| {
            if members.len() == 1 {
                members.remove(0)
            } else {
                let members = members
                    .into_iter()
                    .sorted_by_cached_key(ToString::to_string);
                Fragment::union(members)
            }
        })
        .collect())
}
