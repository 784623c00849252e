//! The recursive driver.
//!
//! Each node is classified once and walked by the rule for its kind. Sibling
//! branches are driven concurrently on the current task: they start in order
//! but may finish in any order.

use std::borrow::Cow;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use elemtree::{Consumer, Context, Element, Node};
use futures::future::{BoxFuture, try_join_all};
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use serde_json::Value;

use crate::classify::{Classified, classify};
use crate::context::{ContextMap, resolve};
use crate::error::WalkError;
use crate::instantiate::{Mount, unwrap_renderable};
use crate::options::{FanOut, WalkOptions};
use crate::visitor::{Outcome, Visit, Visitor};

/// What a branch inherits from its parent.
#[derive(Debug, Clone)]
pub(crate) struct Scope {
    /// Legacy context, replaced when a class component supplies a child context.
    pub context: Arc<Value>,
    /// Provider values, extended when a provider element is entered.
    pub providers: ContextMap,
}

impl Scope {
    pub(crate) fn root(context: Value) -> Self {
        Self {
            context: Arc::new(context),
            providers: ContextMap::new(),
        }
    }
}

/// A failure stamped with the order in which it was raised during the walk.
pub(crate) struct Failure {
    seq: u64,
    error: WalkError,
}

type Step = Result<(), Failure>;

pub(crate) struct Walker<'w, V: ?Sized> {
    visitor: &'w V,
    options: &'w WalkOptions,
    raised: AtomicU64,
}

impl<'w, V> Walker<'w, V>
where
    V: Visitor + ?Sized,
{
    pub(crate) fn new(visitor: &'w V, options: &'w WalkOptions) -> Self {
        Self {
            visitor,
            options,
            raised: AtomicU64::new(0),
        }
    }

    /// Walk `tree` and report the earliest failure raised anywhere in it.
    pub(crate) async fn run(&self, tree: &Node, scope: Scope) -> Result<(), WalkError> {
        self.walk_node(tree, scope)
            .await
            .map_err(|failure| failure.error)
    }

    fn fail(&self, error: WalkError) -> Failure {
        let seq = self.raised.fetch_add(1, Ordering::Relaxed);
        log::debug!("[walk] failure #{seq}: {error}");
        Failure { seq, error }
    }

    /// Walk one node and everything reachable from it.
    fn walk_node<'a>(&'a self, node: &'a Node, scope: Scope) -> BoxFuture<'a, Step> {
        async move {
            let node = unwrap_renderable(Cow::Borrowed(node)).map_err(|e| self.fail(e))?;
            self.dispatch(&node, scope).await
        }
        .boxed()
    }

    async fn dispatch(&self, node: &Node, scope: Scope) -> Step {
        let classified = classify(node);
        log::trace!("[walk] {:?} {}", classified.kind(), node.label());

        match classified {
            Classified::Empty => Ok(()),
            Classified::Collection(items) | Classified::Portal(items) => {
                self.fan_out(items, &scope).await
            }
            Classified::Primitive(leaf) => self.visit_leaf(leaf, &scope).await,
            Classified::Provider(element, context) => {
                self.walk_provider(node, element, context, scope).await
            }
            Classified::Consumer(_, consumer) => self.walk_consumer(consumer, scope).await,
            Classified::Component(element, _) | Classified::Host(element) => {
                self.walk_element(node, element, scope).await
            }
        }
    }

    async fn visit_leaf(&self, leaf: &Node, scope: &Scope) -> Step {
        let visit = Visit {
            node: leaf,
            instance: None,
            component: None,
            context: &scope.context,
            child_context: None,
        };
        self.call_visitor(visit).await.map(|_| ())
    }

    async fn walk_provider(
        &self,
        node: &Node,
        element: &Element,
        context: &Context,
        scope: Scope,
    ) -> Step {
        let value = element.props.get("value").cloned();
        log::debug!("[walk] {} binds {:?}", element.name(), value);
        let scope = Scope {
            providers: scope.providers.extend(context.provider_key(), value),
            ..scope
        };
        self.walk_element(node, element, scope).await
    }

    async fn walk_consumer(&self, consumer: &Consumer, scope: Scope) -> Step {
        let value = resolve(&scope.providers, consumer.context());
        let output = consumer.render(&value).map_err(|source| {
            self.fail(WalkError::Render {
                component: format!("{}.Consumer", consumer.context().name()),
                source,
            })
        })?;
        self.walk_node(&output, scope).await
    }

    /// Visit an element, descend unless the visitor stops, then fire the
    /// class lifecycle hook.
    async fn walk_element(&self, node: &Node, element: &Element, scope: Scope) -> Step {
        let (mut mount, child_context) =
            Mount::prepare(element, &scope.context).map_err(|e| self.fail(e))?;

        let visit = Visit {
            node,
            instance: mount.instance(),
            component: mount.component(),
            context: &scope.context,
            child_context: Some(&*child_context),
        };
        let outcome = self.call_visitor(visit).await?;

        let descended = match outcome {
            Outcome::Stop => {
                log::trace!("[walk] visitor stopped at {}", node.label());
                Ok(())
            }
            Outcome::Continue => {
                let children_scope = Scope {
                    context: child_context,
                    providers: scope.providers,
                };
                self.descend(&mut mount, children_scope).await
            }
        };

        let finished = mount.finish(self.options).map_err(|e| self.fail(e));
        if let (Err(_), Err(hook)) = (&descended, &finished) {
            log::debug!("[walk] dropping hook failure after subtree failure: {}", hook.error);
        }
        descended.and(finished)
    }

    async fn descend(&self, mount: &mut Mount<'_>, scope: Scope) -> Step {
        let children = mount
            .produce_children(&scope.context)
            .and_then(unwrap_renderable)
            .map_err(|e| self.fail(e))?;

        match children.as_ref() {
            Node::Empty => Ok(()),
            Node::List(items) => self.fan_out(items, &scope).await,
            child => self.walk_node(child, scope).await,
        }
    }

    /// Walk siblings concurrently and join them.
    ///
    /// Under [`FanOut::Drain`] the failure raised earliest wins, whichever
    /// sibling settles first.
    async fn fan_out(&self, children: &[Node], scope: &Scope) -> Step {
        let branches = children
            .iter()
            .map(|child| self.walk_node(child, scope.clone()));

        match self.options.fan_out {
            FanOut::FailFast => try_join_all(branches).await.map(|_| ()),
            FanOut::Drain => {
                let mut pending: FuturesUnordered<_> = branches.collect();
                let mut earliest: Option<Failure> = None;
                while let Some(result) = pending.next().await {
                    let Err(failure) = result else { continue };
                    earliest = Some(match earliest {
                        Some(kept) if kept.seq < failure.seq => {
                            log::debug!("[walk] sibling branch also failed: {}", failure.error);
                            kept
                        }
                        Some(kept) => {
                            log::debug!("[walk] sibling branch also failed: {}", kept.error);
                            failure
                        }
                        None => failure,
                    });
                }
                earliest.map_or(Ok(()), Err)
            }
        }
    }

    async fn call_visitor(&self, visit: Visit<'_>) -> Result<Outcome, Failure> {
        let node = visit.node;
        self.visitor.visit(visit).await.map_err(|source| {
            self.fail(WalkError::Visitor {
                node: node.label(),
                source,
            })
        })
    }
}
