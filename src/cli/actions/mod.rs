pub mod run;

use crate::poller::options::Options;

#[derive(Debug)]
pub enum Action {
    Run { options: Options },
}
