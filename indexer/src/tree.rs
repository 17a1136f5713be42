use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

struct Node {
    url: String,
    /// Append-only; guarded per node so concurrent discoveries under
    /// different parents don't serialize on one lock.
    children: Mutex<Vec<usize>>,
}

/// Link structure discovered by one crawl job, kept for diagnostics only.
/// An arena of nodes addressed by integer index; the arena lock covers
/// only slot allocation, child-list appends take the owning node's lock.
/// Reset at the start of the next job.
pub struct CrawlTree {
    nodes: RwLock<Vec<Arc<Node>>>,
}

impl CrawlTree {
    pub const ROOT: usize = 0;

    pub fn new() -> Self {
        Self {
            nodes: RwLock::new(vec![Arc::new(Node {
                url: "/".to_string(),
                children: Mutex::new(Vec::new()),
            })]),
        }
    }

    /// Append a node under `parent` and return its index.
    pub fn add_child(&self, parent: usize, url: &str) -> usize {
        let node = Arc::new(Node {
            url: url.to_string(),
            children: Mutex::new(Vec::new()),
        });
        let (id, parent_node) = {
            let mut nodes = self.nodes.write();
            let id = nodes.len();
            nodes.push(node);
            (id, nodes.get(parent).cloned())
        };
        if let Some(parent_node) = parent_node {
            parent_node.children.lock().push(id);
        }
        id
    }

    pub fn url(&self, id: usize) -> Option<String> {
        self.nodes.read().get(id).map(|node| node.url.clone())
    }

    pub fn children(&self, id: usize) -> Vec<usize> {
        let node = self.nodes.read().get(id).cloned();
        node.map(|node| node.children.lock().clone()).unwrap_or_default()
    }

    /// Number of discovered URLs (the synthetic root is not counted).
    pub fn len(&self) -> usize {
        self.nodes.read().len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn reset(&self) {
        let mut nodes = self.nodes.write();
        nodes.truncate(1);
        nodes[Self::ROOT].children.lock().clear();
    }
}

impl Default for CrawlTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_edges_in_insertion_order() {
        let tree = CrawlTree::new();
        let a = tree.add_child(CrawlTree::ROOT, "http://a.test");
        let b = tree.add_child(a, "http://a.test/b");
        let c = tree.add_child(a, "http://a.test/c");
        assert_eq!(tree.children(CrawlTree::ROOT), vec![a]);
        assert_eq!(tree.children(a), vec![b, c]);
        assert_eq!(tree.url(b).as_deref(), Some("http://a.test/b"));
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn reset_clears_everything_but_the_root() {
        let tree = CrawlTree::new();
        let a = tree.add_child(CrawlTree::ROOT, "http://a.test");
        tree.add_child(a, "http://a.test/b");
        tree.reset();
        assert!(tree.is_empty());
        assert!(tree.children(CrawlTree::ROOT).is_empty());
    }

    #[test]
    fn concurrent_appends_under_different_parents_all_land() {
        let tree = Arc::new(CrawlTree::new());
        let left = tree.add_child(CrawlTree::ROOT, "http://a.test");
        let right = tree.add_child(CrawlTree::ROOT, "http://b.test");

        let mut handles = Vec::new();
        for (parent, host) in [(left, "a"), (right, "b")] {
            for i in 0..8 {
                let tree = tree.clone();
                handles.push(std::thread::spawn(move || {
                    tree.add_child(parent, &format!("http://{host}.test/{i}"));
                }));
            }
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(tree.children(left).len(), 8);
        assert_eq!(tree.children(right).len(), 8);
        assert_eq!(tree.len(), 18);
    }
}
