use tokio::sync::mpsc;

#[derive(Debug)]
pub enum ControlMsg {
    Stop,
}

/// Handle for controlling a running session from the outside.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    control_tx: mpsc::UnboundedSender<ControlMsg>,
}

impl SessionHandle {
    pub(crate) fn new(control_tx: mpsc::UnboundedSender<ControlMsg>) -> SessionHandle {
        SessionHandle { control_tx }
    }

    pub fn send(&self, msg: ControlMsg) {
        self.control_tx
            .send(msg)
            .map_err(|err| {
                log::error!("error sending control message: {err:?}");
            })
            .ok();
    }

    /// Stop the session loop and tear the link down.
    pub fn stop(&self) {
        self.send(ControlMsg::Stop);
    }
}
