use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Identifies a registered handler so it can be explicitly released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerToken(u64);

type Handler<A, E> = Box<dyn FnMut(&A) -> Result<(), E>>;

struct Inner<A, E> {
    // A slot holds None while its handler is being invoked, or after the
    // handler was unregistered mid-delivery.
    handlers: Vec<(u64, Option<Handler<A, E>>)>,
    queue: VecDeque<A>,
    delivering: bool,
    next_token: u64,
}

/// Synchronous, ordered publish/subscribe hub.
///
/// Handlers are invoked in registration order; each runs to completion before
/// the next begins, and `publish` returns only after delivery finishes. The
/// first handler error aborts delivery of the remaining handlers for that
/// action and is returned to the publisher (fail fast, no retry).
///
/// Actions published from inside a handler are queued and delivered after the
/// current action's handler pass completes. A failure also discards the rest
/// of the queued cascade.
///
/// Single-threaded; clones share the same handler list.
pub struct Dispatcher<A, E> {
    inner: Rc<RefCell<Inner<A, E>>>,
}

impl<A, E> Clone for Dispatcher<A, E> {
    fn clone(&self) -> Self {
        Dispatcher { inner: Rc::clone(&self.inner) }
    }
}

impl<A, E> Dispatcher<A, E> {
    pub fn new() -> Self {
        Dispatcher {
            inner: Rc::new(RefCell::new(Inner {
                handlers: Vec::new(),
                queue: VecDeque::new(),
                delivering: false,
                next_token: 0,
            })),
        }
    }

    pub fn register(&self, handler: impl FnMut(&A) -> Result<(), E> + 'static) -> HandlerToken {
        let mut inner = self.inner.borrow_mut();
        let token = inner.next_token;
        inner.next_token += 1;
        inner.handlers.push((token, Some(Box::new(handler))));
        HandlerToken(token)
    }

    pub fn unregister(&self, token: HandlerToken) {
        // Removing the slot entirely also covers a handler that is currently
        // invoked: the post-invocation put-back finds no slot and drops it.
        self.inner.borrow_mut().handlers.retain(|(t, _)| *t != token.0);
    }

    pub fn publish(&self, action: A) -> Result<(), E> {
        {
            let mut inner = self.inner.borrow_mut();
            inner.queue.push_back(action);
            if inner.delivering {
                // Delivered after the in-flight handler pass completes.
                return Ok(());
            }
            inner.delivering = true;
        }

        let result = self.drain();

        let mut inner = self.inner.borrow_mut();
        inner.delivering = false;
        if result.is_err() {
            inner.queue.clear();
        }
        result
    }

    fn drain(&self) -> Result<(), E> {
        loop {
            let action = match self.inner.borrow_mut().queue.pop_front() {
                Some(action) => action,
                None => return Ok(()),
            };
            self.deliver(&action)?;
        }
    }

    fn deliver(&self, action: &A) -> Result<(), E> {
        // Snapshot of the registration order; handlers registered during this
        // pass only see subsequent actions.
        let tokens: Vec<u64> = self.inner.borrow().handlers.iter().map(|(t, _)| *t).collect();

        for token in tokens {
            let handler = {
                let mut inner = self.inner.borrow_mut();
                inner
                    .handlers
                    .iter_mut()
                    .find(|(t, _)| *t == token)
                    .and_then(|(_, slot)| slot.take())
            };

            let Some(mut handler) = handler else { continue };
            let result = handler(action);

            let mut inner = self.inner.borrow_mut();
            if let Some((_, slot)) = inner.handlers.iter_mut().find(|(t, _)| *t == token) {
                *slot = Some(handler);
            }
            drop(inner);

            result?;
        }

        Ok(())
    }
}

impl<A, E> Default for Dispatcher<A, E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn record(log: &Rc<RefCell<Vec<String>>>, entry: String) {
        log.borrow_mut().push(entry);
    }

    #[test]
    fn delivers_in_registration_order() {
        let dispatcher: Dispatcher<u32, String> = Dispatcher::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        for name in ["first", "second", "third"] {
            let log = Rc::clone(&log);
            dispatcher.register(move |action: &u32| {
                record(&log, format!("{name}:{action}"));
                Ok(())
            });
        }

        dispatcher.publish(7).unwrap();
        assert_eq!(*log.borrow(), vec!["first:7", "second:7", "third:7"]);
    }

    #[test]
    fn handler_error_skips_remaining_handlers() {
        let dispatcher: Dispatcher<u32, String> = Dispatcher::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        {
            let log = Rc::clone(&log);
            dispatcher.register(move |_: &u32| {
                record(&log, "ok".into());
                Ok(())
            });
        }
        dispatcher.register(|_: &u32| Err("boom".to_string()));
        {
            let log = Rc::clone(&log);
            dispatcher.register(move |_: &u32| {
                record(&log, "unreachable".into());
                Ok(())
            });
        }

        assert_eq!(dispatcher.publish(1), Err("boom".to_string()));
        assert_eq!(*log.borrow(), vec!["ok"]);

        // The dispatcher stays usable after a failed publish.
        assert_eq!(dispatcher.publish(2), Err("boom".to_string()));
    }

    #[test]
    fn unregistered_handler_no_longer_invoked() {
        let dispatcher: Dispatcher<u32, String> = Dispatcher::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let token = {
            let log = Rc::clone(&log);
            dispatcher.register(move |action: &u32| {
                record(&log, format!("saw:{action}"));
                Ok(())
            })
        };

        dispatcher.publish(1).unwrap();
        dispatcher.unregister(token);
        dispatcher.publish(2).unwrap();

        assert_eq!(*log.borrow(), vec!["saw:1"]);
    }

    #[test]
    fn publish_from_handler_runs_after_current_pass() {
        let dispatcher: Dispatcher<u32, String> = Dispatcher::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        {
            let log = Rc::clone(&log);
            let dispatcher2 = dispatcher.clone();
            dispatcher.register(move |action: &u32| {
                record(&log, format!("a:{action}"));
                if *action == 1 {
                    dispatcher2.publish(2)?;
                    // The cascaded action has not been delivered yet.
                    record(&log, "a:published".into());
                }
                Ok(())
            });
        }
        {
            let log = Rc::clone(&log);
            dispatcher.register(move |action: &u32| {
                record(&log, format!("b:{action}"));
                Ok(())
            });
        }

        dispatcher.publish(1).unwrap();
        assert_eq!(
            *log.borrow(),
            vec!["a:1", "a:published", "b:1", "a:2", "b:2"],
        );
    }
}
