//! Command implementations for the CLI.

use anyhow::Result;
use colored::Colorize;

use wayfarer::ChatAgent;
use wayfarer_client::ChatClient;
use wayfarer_tools::{FlightSearchTool, HotelSearchTool, RandomDestinationTool, SearchConfig};

const PLANNER_NAME: &str = "TravelAgent";

const PLANNER_INSTRUCTIONS: &str = "You are a travel planning assistant. \
Your job is to help users plan their trips by suggesting destinations, activities, and itineraries. \
Use the available tools to get random vacation destinations when needed. \
If a user doesn't specify a destination, use the random destination tool to suggest one. \
When users specify a destination, always plan for that location and do not suggest alternatives.";

const BOOKER_NAME: &str = "BookingAgent";

const BOOKER_INSTRUCTIONS: &str = "You are a booking agent, help me to book flights or hotels.

Thought: Understand the user's intention and confirm whether to use the reservation system to complete the task.

Action:
- If booking a flight, convert the departure name and destination name into airport codes.
- If booking a hotel or flight, use the corresponding tool. Ensure that the necessary parameters are available. If any parameters are missing, use default values or assumptions to proceed.
- If it is not a hotel or flight booking, respond with the final answer only.
- Output the results using a markdown table:
  - For flight bookings, separate the outbound and return contents and list them in the order of Departure Airport | Airline | Flight Number | Departure Time | Arrival Airport | Arrival Time | Duration | Travel Class | Price (USD).
  - For hotel bookings, list them in the order of Property Name | Description | Check-in Time | Check-out Time | Price | Nearby Places | Hotel Class.";

fn print_agent_banner<C: ChatClient>(agent: &ChatAgent<C>) {
    println!(
        "{}",
        "Agent created with the following instructions:".bright_blue()
    );
    println!("{}\n", agent.instructions);
    println!("{}", "Tools available to the agent:".bright_blue());
    let names: Vec<String> = agent
        .tools()
        .into_iter()
        .map(|t| t.function.name)
        .collect();
    println!("{}\n", names.join(", "));
}

/// Plans a trip, running each message in turn on one shared thread.
pub async fn plan<C: ChatClient>(client: C, messages: Vec<String>) -> Result<()> {
    let agent = ChatAgent::new(client)
        .with_name(PLANNER_NAME)
        .with_instructions(PLANNER_INSTRUCTIONS)
        .with_tool(RandomDestinationTool);

    print_agent_banner(&agent);

    let mut thread = agent.new_thread();
    for message in messages {
        println!("{} {message}", "User:".bright_green());
        let response = agent.run_on_thread(&mut thread, message.clone()).await?;
        println!("{}", "Travel plan:".bright_yellow());
        println!("{}\n", response.text());
    }

    Ok(())
}

/// Books hotels and flights for a trip described in one message.
pub async fn book<C: ChatClient>(
    client: C,
    search_config: SearchConfig,
    message: String,
) -> Result<()> {
    let agent = ChatAgent::new(client)
        .with_name(BOOKER_NAME)
        .with_instructions(BOOKER_INSTRUCTIONS)
        .with_tool(HotelSearchTool::new(search_config.clone())?)
        .with_tool(FlightSearchTool::new(search_config)?);

    print_agent_banner(&agent);

    println!("{} {message}", "User:".bright_green());
    let mut thread = agent.new_thread();
    let response = agent.run_on_thread(&mut thread, message).await?;
    println!("{}", "Booking details:".bright_yellow());
    println!("{}", response.text());

    Ok(())
}
