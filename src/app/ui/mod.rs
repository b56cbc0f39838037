mod controls;
mod details;
mod devices;

pub(super) use details::DetailPanel;
pub(super) use devices::DeviceDirectory;
