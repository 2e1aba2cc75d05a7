//! Panel ordering and group colors.
//!
//! The order in which samples are stacked, and the color given to each group,
//! combine up to three optional caller inputs (an explicit sample list, an
//! explicit group list, and explicit colors) with fallbacks taken from the
//! experiment metadata. The rules are applied in a fixed order of precedence:
//!
//! 1. Every explicitly named sample and group must exist in the metadata.
//! 2. If groups are given, panels are grouped in that order. Within a group,
//!    samples follow the explicit sample list when one is given and the
//!    metadata order otherwise. When both lists are given they must agree:
//!    every sample of a listed group must be listed, and every listed sample
//!    must belong to a listed group.
//! 3. Otherwise groups are taken in order of first appearance in the
//!    metadata, and panels follow the explicit sample list or, failing that,
//!    the metadata order.
//! 4. Groups are colored in group order from the explicit colors or, failing
//!    that, the default palette. Running out of colors is an error.

use indexmap::IndexMap;
use itertools::Itertools;
use tracing::debug;

use crate::errors::Error;
use crate::errors::Result;
use crate::metadata::ExperimentMetadata;
use crate::plot::color::default_palette;
use crate::plot::color::Rgb;

/// The resolved stacking order of panels and the order of groups.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PanelOrder {
    /// Samples, top panel first.
    pub samples: Vec<String>,

    /// Groups, in the order they receive colors.
    pub groups: Vec<String>,
}

/// Resolves the panel order from the metadata and the optional explicit
/// sample and group lists.
pub fn resolve_order(
    metadata: &ExperimentMetadata,
    samples: Option<&[String]>,
    groups: Option<&[String]>,
) -> Result<PanelOrder> {
    let samples = samples.map(|s| s.iter().map(String::as_str).unique().collect::<Vec<_>>());
    let groups = groups.map(|g| g.iter().map(String::as_str).unique().collect::<Vec<_>>());

    // (1) Every name the caller gave must be known.
    if let Some(samples) = &samples {
        if let Some(unknown) = samples.iter().find(|s| metadata.get(s).is_none()) {
            return Err(Error::UnknownSample(unknown.to_string()));
        }
    }

    let known_groups = metadata.groups();
    if let Some(groups) = &groups {
        if let Some(unknown) = groups.iter().find(|g| !known_groups.contains(g)) {
            return Err(Error::UnknownGroup(unknown.to_string()));
        }
    }

    let order = match (groups, samples) {
        // (2) Grouped panels, optionally ordered within each group.
        (Some(groups), samples) => {
            if let Some(samples) = &samples {
                for sample in samples {
                    let group = metadata
                        .get(sample)
                        .map(|info| info.group.as_str())
                        .unwrap_or_default();
                    if !groups.contains(&group) {
                        return Err(Error::SampleOrderConflict(format!(
                            "sample `{}` belongs to group `{}`, which is not in the group list",
                            sample, group
                        )));
                    }
                }
            }

            let mut ordered = Vec::new();
            for group in &groups {
                let mut members = metadata.samples_in_group(group).collect::<Vec<_>>();

                if let Some(samples) = &samples {
                    if let Some(missing) = members.iter().find(|m| !samples.contains(m)) {
                        return Err(Error::SampleOrderConflict(format!(
                            "sample `{}` of group `{}` is not in the sample list",
                            missing, group
                        )));
                    }

                    members.sort_by_key(|m| samples.iter().position(|s| s == m));
                }

                ordered.extend(members.into_iter().map(String::from));
            }

            PanelOrder {
                samples: ordered,
                groups: groups.into_iter().map(String::from).collect(),
            }
        }

        // (3) Metadata group order; explicit or metadata sample order.
        (None, samples) => PanelOrder {
            samples: match samples {
                Some(samples) => samples.into_iter().map(String::from).collect(),
                None => metadata.sample_names().map(String::from).collect(),
            },
            groups: known_groups.into_iter().map(String::from).collect(),
        },
    };

    debug!(
        "panel order: [{}]; group order: [{}]",
        order.samples.join(", "),
        order.groups.join(", ")
    );

    Ok(order)
}

/// Assigns one color to each group, in order.
pub fn assign_colors(groups: &[String], overrides: Option<&[String]>) -> Result<IndexMap<String, Rgb>> {
    let colors = match overrides {
        Some(overrides) => {
            if overrides.len() < groups.len() {
                return Err(Error::ColorCountMismatch {
                    colors: overrides.len(),
                    groups: groups.len(),
                });
            }

            overrides
                .iter()
                .map(|c| c.parse::<Rgb>())
                .collect::<Result<Vec<_>>>()?
        }
        None => default_palette(),
    };

    if colors.len() < groups.len() {
        return Err(Error::ColorCountMismatch {
            colors: colors.len(),
            groups: groups.len(),
        });
    }

    Ok(groups.iter().cloned().zip(colors).collect())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::metadata::SampleInfo;

    fn metadata() -> ExperimentMetadata {
        let mut metadata = ExperimentMetadata::new();
        for (sample, group) in [("R1", "ref"), ("A1", "alt"), ("R2", "ref"), ("A2", "alt")] {
            metadata.insert(
                sample,
                SampleInfo {
                    group: group.to_string(),
                    bam: PathBuf::from(format!("{}.bam", sample)),
                },
            );
        }
        metadata
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_default_order_is_metadata_order() {
        let order = resolve_order(&metadata(), None, None).unwrap();
        assert_eq!(order.samples, strings(&["R1", "A1", "R2", "A2"]));
        assert_eq!(order.groups, strings(&["ref", "alt"]));
    }

    #[test]
    fn test_explicit_samples_only() {
        let samples = strings(&["A2", "R1"]);
        let order = resolve_order(&metadata(), Some(&samples), None).unwrap();
        assert_eq!(order.samples, samples);
        assert_eq!(order.groups, strings(&["ref", "alt"]));
    }

    #[test]
    fn test_groups_only() {
        let groups = strings(&["alt", "ref"]);
        let order = resolve_order(&metadata(), None, Some(&groups)).unwrap();
        assert_eq!(order.samples, strings(&["A1", "A2", "R1", "R2"]));
        assert_eq!(order.groups, groups);
    }

    #[test]
    fn test_groups_restrict_panels() {
        let groups = strings(&["alt"]);
        let order = resolve_order(&metadata(), None, Some(&groups)).unwrap();
        assert_eq!(order.samples, strings(&["A1", "A2"]));
    }

    #[test]
    fn test_groups_and_samples() {
        let groups = strings(&["ref", "alt"]);
        let samples = strings(&["A2", "R2", "A1", "R1"]);
        let order = resolve_order(&metadata(), Some(&samples), Some(&groups)).unwrap();
        assert_eq!(order.samples, strings(&["R2", "R1", "A2", "A1"]));
    }

    #[test]
    fn test_sample_outside_listed_groups_conflicts() {
        let groups = strings(&["ref"]);
        let samples = strings(&["R1", "R2", "A1"]);
        let err = resolve_order(&metadata(), Some(&samples), Some(&groups)).unwrap_err();
        assert!(matches!(err, Error::SampleOrderConflict(ref m) if m.contains("A1")));
    }

    #[test]
    fn test_unlisted_group_member_conflicts() {
        let groups = strings(&["ref"]);
        let samples = strings(&["R1"]);
        let err = resolve_order(&metadata(), Some(&samples), Some(&groups)).unwrap_err();
        assert!(matches!(err, Error::SampleOrderConflict(ref m) if m.contains("R2")));
    }

    #[test]
    fn test_unknown_names() {
        let samples = strings(&["R9"]);
        assert!(matches!(
            resolve_order(&metadata(), Some(&samples), None),
            Err(Error::UnknownSample(ref s)) if s == "R9"
        ));

        let groups = strings(&["ko"]);
        assert!(matches!(
            resolve_order(&metadata(), None, Some(&groups)),
            Err(Error::UnknownGroup(ref g)) if g == "ko"
        ));
    }

    #[test]
    fn test_colors_from_palette() {
        let colors = assign_colors(&strings(&["ref", "alt"]), None).unwrap();
        assert_eq!(colors["ref"], Rgb(0xa6, 0xce, 0xe3));
        assert_eq!(colors["alt"], Rgb(0x1f, 0x78, 0xb4));
    }

    #[test]
    fn test_color_overrides() {
        let overrides = strings(&["#000000", "red", "blue"]);
        let colors = assign_colors(&strings(&["ref", "alt"]), Some(&overrides)).unwrap();
        assert_eq!(colors.len(), 2);
        assert_eq!(colors["alt"], Rgb(255, 0, 0));
    }

    #[test]
    fn test_too_few_colors() {
        let overrides: Vec<String> = Vec::new();
        let err = assign_colors(&strings(&["ref", "alt"]), Some(&overrides)).unwrap_err();
        assert!(matches!(
            err,
            Error::ColorCountMismatch {
                colors: 0,
                groups: 2
            }
        ));

        let many = (0..13).map(|i| format!("g{}", i)).collect::<Vec<_>>();
        assert!(matches!(
            assign_colors(&many, None),
            Err(Error::ColorCountMismatch {
                colors: 12,
                groups: 13
            })
        ));
    }
}
