use std::collections::HashSet;

use crate::ir::{NodeKind, Roadmap};

use super::types::{Column, ProxyNode, RankGroup};

/// Column mode: one global rank group per non-empty column.
pub(super) fn column_rank_groups(columns: &[Vec<String>; 4]) -> Vec<RankGroup> {
    Column::ALL
        .iter()
        .filter(|column| !columns[column.index()].is_empty())
        .map(|column| RankGroup {
            name: format!("rank_{}", column.group_name()),
            cluster: None,
            proxy: None,
            members: columns[column.index()].clone(),
        })
        .collect()
}

/// Stacked mode: every task of a cluster gets one or more rows holding a
/// batch of its methods, each anchored by a proxy in the stage column. The
/// task itself sits in row 0 only; later rows are stacked under it through
/// their proxies.
///
/// A method joins at most one row, and only rows of its own cluster, so no
/// node is ever pulled into two rank groups or two cluster boxes.
pub(super) fn method_rows(roadmap: &Roadmap, batch: usize) -> (Vec<RankGroup>, Vec<ProxyNode>) {
    let mut groups = Vec::new();
    let mut proxies = Vec::new();
    let mut claimed: HashSet<&str> = HashSet::new();
    let mut taken_ids: HashSet<String> = roadmap
        .nodes()
        .iter()
        .map(|node| node.id().to_string())
        .collect();

    for cluster in roadmap.clusters() {
        let members = roadmap.nodes_in_cluster(cluster.id());
        let anchor = members
            .iter()
            .find(|node| node.kind() == NodeKind::StageLabel)
            .map(|node| node.id())
            .unwrap_or(cluster.id());

        for task in members.iter().filter(|node| node.kind() == NodeKind::Task) {
            let mut methods = Vec::new();
            for edge in roadmap.edges().iter().filter(|e| e.source() == task.id()) {
                let Some(target) = roadmap.node(edge.target()) else {
                    continue;
                };
                if target.kind() != NodeKind::Method || target.parent_cluster() != cluster.id() {
                    continue;
                }
                if claimed.insert(target.id()) {
                    methods.push(target.id().to_string());
                }
            }

            for (row, chunk) in chunk_rows(&methods, batch).into_iter().enumerate() {
                let proxy_id = unique_id(
                    format!("proxy_{}_{}_{}", anchor, task.id(), row),
                    &mut taken_ids,
                );
                log::debug!(
                    "row {} of task {} holds {} method(s)",
                    row,
                    task.id(),
                    chunk.len()
                );
                let mut row_members = Vec::with_capacity(chunk.len() + 1);
                if row == 0 {
                    row_members.push(task.id().to_string());
                }
                row_members.extend(chunk);
                groups.push(RankGroup {
                    name: format!("row_{}_{}_{}", cluster.id(), task.id(), row),
                    cluster: Some(cluster.id().to_string()),
                    proxy: Some(proxy_id.clone()),
                    members: row_members,
                });
                proxies.push(ProxyNode {
                    id: proxy_id,
                    cluster: cluster.id().to_string(),
                    task: task.id().to_string(),
                    row,
                });
            }
        }
    }

    (groups, proxies)
}

/// Splits `items` into batches of at most `batch`. An empty input still yields
/// one (empty) row so the anchor is emitted.
pub fn chunk_rows(items: &[String], batch: usize) -> Vec<Vec<String>> {
    if items.is_empty() {
        return vec![Vec::new()];
    }
    items
        .chunks(batch.max(1))
        .map(|chunk| chunk.to_vec())
        .collect()
}

fn unique_id(candidate: String, taken: &mut HashSet<String>) -> String {
    let mut id = candidate;
    while taken.contains(&id) {
        id.push('_');
    }
    taken.insert(id.clone());
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("m{i}")).collect()
    }

    #[test]
    fn chunking_is_bounded_by_batch_size() {
        for (count, batch) in [(1, 3), (3, 3), (4, 3), (7, 2), (9, 3), (5, 1)] {
            let rows = chunk_rows(&ids(count), batch);
            assert_eq!(rows.len(), count.div_ceil(batch), "{count}/{batch}");
            assert!(rows.iter().all(|row| !row.is_empty() && row.len() <= batch));
            assert_eq!(rows.concat(), ids(count));
        }
    }

    #[test]
    fn no_methods_yields_single_empty_row() {
        assert_eq!(chunk_rows(&[], 3), vec![Vec::<String>::new()]);
    }

    #[test]
    fn proxy_ids_avoid_real_nodes() {
        let mut taken: HashSet<String> = ["proxy_s1_t1_0".to_string()].into_iter().collect();
        assert_eq!(
            unique_id("proxy_s1_t1_0".to_string(), &mut taken),
            "proxy_s1_t1_0_"
        );
        assert_eq!(unique_id("proxy_s1_t1_1".to_string(), &mut taken), "proxy_s1_t1_1");
    }

    #[test]
    fn column_groups_skip_empty_columns() {
        let columns = [
            vec!["s1".to_string()],
            vec!["t1".to_string(), "t2".to_string()],
            Vec::new(),
            vec!["m1".to_string()],
        ];
        let groups = column_rank_groups(&columns);
        let names: Vec<&str> = groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["rank_phase", "rank_task", "rank_method"]);
        assert_eq!(groups[1].members, vec!["t1", "t2"]);
    }
}
