use std::cmp::Ordering;

use crate::{client::Client, index::WalletRef, wallet::Wallet};

/// Stable handle of a tree node. Stays valid until its client is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug)]
struct Node {
    client: Client,
    left: Option<NodeId>,
    right: Option<NodeId>,
}

/// Unbalanced binary search tree of clients keyed by client id.
///
/// Nodes live in an arena and reference each other by [`NodeId`]. Removing a
/// node relinks its neighbours instead of moving clients between nodes, so the
/// ids handed out for the remaining clients never change.
///
/// The tree is never ordered by balance: balances change on every transfer and
/// would leave the tree out of order. [`ClientTree::ranked_by_balance`] computes
/// that ordering on demand.
#[derive(Debug, Default)]
pub struct ClientTree {
    nodes: Vec<Option<Node>>,
    free: Vec<usize>,
    root: Option<NodeId>,
    len: usize,
}

impl ClientTree {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Ids compare lexicographically; smaller ids go left, equal or greater go right.
    pub fn insert(&mut self, client: Client) -> NodeId {
        let key = client.id().to_owned();
        let new = self.alloc(Node {
            client,
            left: None,
            right: None,
        });

        let Some(mut current) = self.root else {
            self.root = Some(new);
            return new;
        };
        loop {
            let node = self.node_mut(current);
            let link = if key.as_str() < node.client.id() {
                &mut node.left
            } else {
                &mut node.right
            };
            match *link {
                Some(next) => current = next,
                None => {
                    *link = Some(new);
                    return new;
                }
            }
        }
    }

    pub fn find_node(&self, id: &str) -> Option<NodeId> {
        let mut current = self.root;
        while let Some(node_id) = current {
            let node = self.node(node_id);
            current = match id.cmp(node.client.id()) {
                Ordering::Equal => return Some(node_id),
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
            };
        }
        None
    }

    pub fn find(&self, id: &str) -> Option<&Client> {
        self.find_node(id).map(|node_id| &self.node(node_id).client)
    }

    /// Standard BST deletion by id, returns the removed client.
    ///
    /// With two children the node is replaced by the minimum of its right subtree.
    pub fn remove(&mut self, id: &str) -> Option<Client> {
        let mut parent = None;
        let mut current = self.root;
        while let Some(node_id) = current {
            let node = self.node(node_id);
            match id.cmp(node.client.id()) {
                Ordering::Equal => break,
                Ordering::Less => {
                    parent = current;
                    current = node.left;
                }
                Ordering::Greater => {
                    parent = current;
                    current = node.right;
                }
            }
        }
        let target = current?;

        let (left, right) = {
            let node = self.node(target);
            (node.left, node.right)
        };
        let replacement = match (left, right) {
            (None, child) | (child, None) => child,
            (Some(left), Some(right)) => {
                let successor = self.detach_min(right);
                let node = self.node_mut(successor);
                node.left = Some(left);
                if successor != right {
                    node.right = Some(right);
                }
                Some(successor)
            }
        };
        self.replace_child(parent, target, replacement);

        self.free.push(target.0);
        self.len -= 1;
        self.nodes[target.0].take().map(|node| node.client)
    }

    /// First client (pre-order) owning the given wallet. Linear in client count.
    pub fn find_by_wallet(&self, wallet_id: &str) -> Option<&Client> {
        let mut stack: Vec<NodeId> = self.root.into_iter().collect();
        while let Some(node_id) = stack.pop() {
            let node = self.node(node_id);
            if node.client.owns_wallet(wallet_id) {
                return Some(&node.client);
            }
            stack.extend(node.right);
            stack.extend(node.left);
        }
        None
    }

    /// In-order (ascending id) traversal.
    pub fn iter(&self) -> InOrder<'_> {
        let mut iter = InOrder {
            tree: self,
            stack: Vec::new(),
        };
        iter.push_left_spine(self.root);
        iter
    }

    /// Clients by ascending current total balance, ties in id order.
    pub fn ranked_by_balance(&self) -> Vec<&Client> {
        let mut clients: Vec<&Client> = self.iter().collect();
        clients.sort_by_cached_key(|client| client.total_balance());
        clients
    }

    pub fn client(&self, node_id: NodeId) -> Option<&Client> {
        self.nodes.get(node_id.0)?.as_ref().map(|node| &node.client)
    }

    pub(crate) fn client_mut(&mut self, node_id: NodeId) -> Option<&mut Client> {
        self.nodes
            .get_mut(node_id.0)?
            .as_mut()
            .map(|node| &mut node.client)
    }

    pub fn wallet(&self, wallet_ref: WalletRef) -> Option<&Wallet> {
        self.client(wallet_ref.node)?.wallet_at(wallet_ref.slot)
    }

    pub(crate) fn wallet_mut(&mut self, wallet_ref: WalletRef) -> Option<&mut Wallet> {
        self.client_mut(wallet_ref.node)?
            .wallet_at_mut(wallet_ref.slot)
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        self.len += 1;
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = Some(node);
                NodeId(slot)
            }
            None => {
                self.nodes.push(Some(node));
                NodeId(self.nodes.len() - 1)
            }
        }
    }

    /// Unlinks the leftmost node of the subtree rooted at `subtree` and returns it.
    fn detach_min(&mut self, subtree: NodeId) -> NodeId {
        let mut parent = None;
        let mut current = subtree;
        while let Some(left) = self.node(current).left {
            parent = Some(current);
            current = left;
        }
        if let Some(parent) = parent {
            let right = self.node(current).right;
            self.node_mut(parent).left = right;
        }
        current
    }

    fn replace_child(&mut self, parent: Option<NodeId>, old: NodeId, new: Option<NodeId>) {
        match parent {
            None => self.root = new,
            Some(parent) => {
                let node = self.node_mut(parent);
                if node.left == Some(old) {
                    node.left = new;
                } else {
                    node.right = new;
                }
            }
        }
    }

    fn node(&self, node_id: NodeId) -> &Node {
        self.nodes[node_id.0]
            .as_ref()
            .expect("tree links only point at live nodes")
    }

    fn node_mut(&mut self, node_id: NodeId) -> &mut Node {
        self.nodes[node_id.0]
            .as_mut()
            .expect("tree links only point at live nodes")
    }
}

pub struct InOrder<'a> {
    tree: &'a ClientTree,
    stack: Vec<NodeId>,
}

impl InOrder<'_> {
    fn push_left_spine(&mut self, mut current: Option<NodeId>) {
        while let Some(node_id) = current {
            self.stack.push(node_id);
            current = self.tree.node(node_id).left;
        }
    }
}

impl<'a> Iterator for InOrder<'a> {
    type Item = &'a Client;

    fn next(&mut self) -> Option<Self::Item> {
        let node_id = self.stack.pop()?;
        let node = self.tree.node(node_id);
        self.push_left_spine(node.right);
        Some(&node.client)
    }
}

impl<'a> IntoIterator for &'a ClientTree {
    type Item = &'a Client;
    type IntoIter = InOrder<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
