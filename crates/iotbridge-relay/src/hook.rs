use iotbridge_message::Message;

/// Processes one received message.
///
/// The receiver calls the hook synchronously and does not accept the next
/// connection until it returns. Nothing is returned to the loop: failures
/// must be handled inside the hook, and a panic takes the receiver down.
pub trait MessageHook {
    fn process(&mut self, message: &Message);
}

impl<F> MessageHook for F
where
    F: FnMut(&Message),
{
    fn process(&mut self, message: &Message) {
        self(message)
    }
}
