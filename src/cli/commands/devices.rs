use super::{print_one, print_stream};
use crate::cli::args::DevicesCommands;
use crate::client::IncydrClient;
use crate::devices::{self, DeviceFilter};
use crate::error::Result;

pub async fn handle_devices_command(command: DevicesCommands, client: &IncydrClient) -> Result<()> {
    match command {
        DevicesCommands::List {
            active,
            blocked,
            output,
        } => {
            let filter = DeviceFilter {
                active,
                blocked,
                ..Default::default()
            };
            print_stream(devices::iter_all(client, filter), &output).await?;
            Ok(())
        }
        DevicesCommands::Show { device_id, output } => {
            print_one(&devices::get_device(client, &device_id).await?, &output)
        }
    }
}
