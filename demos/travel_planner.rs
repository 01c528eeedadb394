//! A travel-planning agent that finds points of interest, researches each of
//! them in parallel, then writes the final plan.
//!
//! This example demonstrates:
//! - Declaring typed actions and letting the planner order them
//! - Registering models from TOML configuration through a connector
//! - Selecting models by name and by default from inside actions
//! - Fanning out with `parallel_map` under a concurrency limit
//!
//! The models are canned stubs, so the example runs without network access.
//! Run it with `cargo run --example travel_planner`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use telos::prelude::*;
use telos::{
    ModelError, ModelHandle, ModelProperties, ModelRequest, ModelResponse, ModelsConfig,
    ProviderConnector, output, register_models,
};

// ============================================================================
// Domain types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TravelBrief {
    destination: String,
    dates: String,
    brief: String,
}

impl DomainType for TravelBrief {
    const TAG: &'static str = "TravelBrief";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PointOfInterest {
    name: String,
    description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ItineraryIdeas {
    points_of_interest: Vec<PointOfInterest>,
}

impl DomainType for ItineraryIdeas {
    const TAG: &'static str = "ItineraryIdeas";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PointOfInterestFindings {
    findings: Vec<String>,
}

impl DomainType for PointOfInterestFindings {
    const TAG: &'static str = "PointOfInterestFindings";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TravelPlan {
    plan: String,
}

impl DomainType for TravelPlan {
    const TAG: &'static str = "TravelPlan";
}

// ============================================================================
// Actions
// ============================================================================

struct FindPointsOfInterest;

#[async_trait]
impl AsyncActionLogic for FindPointsOfInterest {
    async fn execute(
        &self,
        inputs: &ActionInputs,
        ctx: &ActionContext<'_>,
    ) -> Result<DomainValue, ActionError> {
        let brief: TravelBrief = inputs.value()?;
        let prompt = format!(
            "Find points of interest in {} for {}. Brief: {}. Reply as JSON.",
            brief.destination, brief.dates, brief.brief
        );
        let ideas: ItineraryIdeas = ctx.prompt_for(&LlmOptions::default(), prompt).await?;
        output(&ideas)
    }
}

struct ResearchPointsOfInterest;

#[async_trait]
impl AsyncActionLogic for ResearchPointsOfInterest {
    async fn execute(
        &self,
        inputs: &ActionInputs,
        ctx: &ActionContext<'_>,
    ) -> Result<DomainValue, ActionError> {
        let brief: TravelBrief = inputs.value()?;
        let ideas: ItineraryIdeas = inputs.value()?;
        let researcher = LlmOptions::by_name("researcher-large").with_temperature(0.2);

        let findings = ctx
            .parallel_map(ideas.points_of_interest, |poi| {
                let prompt = format!(
                    "Research {} ({}) for a trip on {}.",
                    poi.name, poi.description, brief.dates
                );
                let researcher = &researcher;
                async move { ctx.prompt(researcher, prompt).await }
            })
            .await?;

        output(&PointOfInterestFindings { findings })
    }
}

struct CreateTravelPlan;

#[async_trait]
impl AsyncActionLogic for CreateTravelPlan {
    async fn execute(
        &self,
        inputs: &ActionInputs,
        ctx: &ActionContext<'_>,
    ) -> Result<DomainValue, ActionError> {
        let brief: TravelBrief = inputs.value()?;
        let findings: PointOfInterestFindings = inputs.value()?;
        let prompt = format!(
            "Write a travel plan for {} using these findings:\n- {}",
            brief.destination,
            findings.findings.join("\n- ")
        );
        let plan = ctx.prompt(&LlmOptions::default(), prompt).await?;
        output(&TravelPlan { plan })
    }
}

fn travel_planner() -> Result<Agent, Box<dyn std::error::Error>> {
    let find = ActionDescriptor::parse("find_points_of_interest", "TravelBrief -> ItineraryIdeas")?
        .tool_group("web")
        .tool_group("maps");
    let research = ActionDescriptor::parse(
        "research_points_of_interest",
        "TravelBrief, ItineraryIdeas -> PointOfInterestFindings",
    )?
    .tool_group("web");
    let create = ActionDescriptor::parse(
        "create_travel_plan",
        "TravelBrief, PointOfInterestFindings -> TravelPlan",
    )?
    .achieves_goal("Create a detailed travel plan based on a given travel brief");

    // Declared out of order on purpose: the planner works out the sequence.
    let agent = Agent::builder("TravelPlanner")
        .description("Makes a detailed travel plan")
        .action(Action::new_async(create, CreateTravelPlan))
        .action(Action::new_async(research, ResearchPointsOfInterest))
        .action(Action::new_async(find, FindPointsOfInterest))
        .build()?;
    Ok(agent)
}

// ============================================================================
// Stub models
// ============================================================================

/// Replies with canned text chosen from the prompt's first word.
struct CannedModel;

#[async_trait]
impl ModelHandle for CannedModel {
    async fn complete(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
        let reply = if request.prompt.starts_with("Find") {
            serde_json::json!({
                "points_of_interest": [
                    {"name": "Louvre", "description": "art museum"},
                    {"name": "Canal Saint-Martin", "description": "walk along the water"},
                    {"name": "Sainte-Chapelle", "description": "stained glass"}
                ]
            })
            .to_string()
        } else if let Some(rest) = request.prompt.strip_prefix("Research ") {
            let place = rest.split(" (").next().unwrap_or(rest);
            format!("{}: go early, book ahead ({})", place, request.model)
        } else {
            format!("Day plan by {}:\n{}", request.model, request.prompt)
        };
        Ok(ModelResponse::text(reply))
    }
}

struct CannedConnector;

#[async_trait]
impl ProviderConnector for CannedConnector {
    fn provider(&self) -> &str {
        "Canned"
    }

    async fn connect(&self, _model: &ModelProperties) -> Result<Arc<dyn ModelHandle>, ModelError> {
        Ok(Arc::new(CannedModel))
    }
}

const MODELS: &str = r#"
default_model = "planner-small"

[[models]]
name = "planner-small"
knowledge_cutoff = "2024-06-01"
input_price = 0.1
output_price = 0.4

[[models]]
name = "researcher-large"
knowledge_cutoff = "2024-10-01"
input_price = 2.5
output_price = 10.0
"#;

// ============================================================================
// Main
// ============================================================================

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let registry = Arc::new(ProviderRegistry::new());
    let report = register_models(&registry, &ModelsConfig::from_toml(MODELS)?, &CannedConnector).await;
    println!("Registered models: {:?}", report.registered);

    let mut platform = AgentPlatform::new(Arc::clone(&registry));
    platform.deploy(travel_planner()?);

    let brief = TravelBrief {
        destination: "Paris".to_string(),
        dates: "June 1-3".to_string(),
        brief: "Art, food and long walks".to_string(),
    };
    let options = RunOptions::default()
        .with_concurrency_limit(2)
        .with_tool_permissions(ToolPermissions::only(["web", "maps"]));

    let outcome = platform
        .run_agent("TravelPlanner", TypedValue::of(&brief)?, options)
        .await?;

    println!("Plan: {}", outcome.plan);
    for record in outcome.session.log() {
        println!("  {} took {}ms", record.action, record.elapsed_ms);
    }
    let plan: TravelPlan = outcome.output_as()?;
    println!("\n{}", plan.plan);
    Ok(())
}
