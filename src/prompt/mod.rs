use crate::wire::{AppType, GenerationRequest};

fn architecture_rules() -> &'static str {
r#"Architecture Rules (MANDATORY):
- Clean Architecture: keep presentation, domain and data concerns in separate folders; screens never talk to HTTP clients directly.
- MVVM + Repository: screens observe a view-model/provider; providers call repositories; repositories own data sources (REST, local storage).
- Dependency Injection: register services and repositories in one place (e.g. `get_it` in `lib/config/`), never construct them inside widgets.
- State Management: use the requested library consistently; expose immutable state and notify listeners on change.
- Models are plain immutable classes with `fromJson`/`toJson`.
- Handle errors explicitly (try/catch around IO, user-facing error states in the UI).
- Use Material Design 3 (`useMaterial3: true`) and a single `ThemeData` defined at the app root.
- Layouts must be responsive; avoid hard-coded pixel widths for whole screens."#
}

fn folder_layout() -> &'static str {
r#"Folder Layout:
- lib/main.dart            entry point with `void main()` and `runApp(...)`
- lib/models/              data classes
- lib/screens/             one file per screen widget
- lib/providers/           state management (ChangeNotifier, StateNotifier, Bloc...)
- lib/repositories/        data access behind abstract interfaces
- lib/services/            API clients, storage, platform services
- lib/widgets/             reusable widgets
- lib/config/              theme, routes, dependency injection
- lib/utils/               helpers, validators, constants
- pubspec.yaml             with `dependencies:` and a top-level `flutter:` section
- README.md                short project overview"#
}

fn output_format() -> &'static str {
r#"Output Format (STRICT):
- Emit every file as ONE path comment line immediately followed by ONE fenced code block:
    // lib/screens/home_screen.dart
    ```dart
    ...full file content...
    ```
- Use `# pubspec.yaml` before the manifest block and `<!-- README.md -->` before the readme block.
- Paths are relative to the project root. Never use absolute paths or `..`.
- Always include lib/main.dart, pubspec.yaml and README.md.
- Write complete, compilable code. No placeholders such as `// TODO: implement`, no ellipses.
- Do NOT write setup instructions, tutorials or step-by-step explanations; return code only."#
}

/// Domain guidance appended to the system prompt, one block per app type.
pub fn guidelines(app_type: AppType) -> &'static str {
    match app_type {
        AppType::Ecommerce => r#"App Type Guidelines (ecommerce):
- Product catalogue with categories, search and product details.
- Shopping cart provider with quantities, totals and persistence.
- Checkout flow (address, payment method, order summary) with form validation.
- Order history and a user profile screen."#,
        AppType::Social => r#"App Type Guidelines (social):
- Feed of posts with pull-to-refresh and pagination.
- Post composer with image attachment placeholder.
- Likes, comments and follow/unfollow interactions.
- User profiles and a notifications screen."#,
        AppType::Productivity => r#"App Type Guidelines (productivity):
- Task/note model with due dates, priorities and completion state.
- Lists with filtering and sorting; create/edit forms with validation.
- Local persistence behind a repository interface.
- Reminders or a calendar overview."#,
        AppType::Fitness => r#"App Type Guidelines (fitness):
- Workout and exercise models with sets, reps and duration.
- Activity tracking dashboard with progress charts.
- Goals with streaks and history.
- Timer screen for active workouts."#,
        AppType::Education => r#"App Type Guidelines (education):
- Courses, lessons and quizzes as models.
- Lesson viewer with progress tracking.
- Quiz flow with scoring and review of answers.
- Learner profile with achievements."#,
        AppType::Entertainment => r#"App Type Guidelines (entertainment):
- Media catalogue (movies, music or games) with rich cards.
- Details screen with ratings and favourites.
- Search and category browsing.
- Watchlist/playlist management."#,
        AppType::General => r#"App Type Guidelines (general):
- A complete mobile app with navigation between several screens.
- State management wired through the whole app.
- At least one model, repository and service layer.
- Settings screen with theme selection."#,
    }
}

pub fn system_prompt(app_type: AppType) -> String {
    format!(
"You are a senior Flutter engineer who generates complete, production-ready Flutter projects.

{architecture_rules}

{folder_layout}

{output_format}

{guidelines}",
        architecture_rules = architecture_rules(),
        folder_layout = folder_layout(),
        output_format = output_format(),
        guidelines = guidelines(app_type),
    )
}

fn bullet_list(items: &[String]) -> String {
    if items.is_empty() {
        return " - (none specified)\n".to_string();
    }
    let mut s = String::new();
    for item in items {
        s.push_str(" - ");
        s.push_str(item);
        s.push('\n');
    }
    s
}

pub fn user_prompt(req: &GenerationRequest) -> String {
    let testing = if req.preferences.testing {
        "yes: include widget and unit tests under test/"
    } else {
        "no"
    };
    format!(
"App description:
{description}

App type: {app_type}
Target platforms: {platforms}
Complexity: {complexity}
State management: {state_management}
Architecture: {architecture}
Tests required: {testing}

Features:
{features}
Files to produce:
 - lib/main.dart
 - pubspec.yaml
 - README.md
 - lib/models/, lib/screens/, lib/providers/, lib/repositories/, lib/services/, lib/widgets/ as the features require

Return only path comments and fenced code blocks.",
        description = req.description.trim(),
        app_type = req.app_type,
        platforms = req.requirements.platforms.join(", "),
        complexity = req.requirements.complexity,
        state_management = req.preferences.state_management,
        architecture = req.preferences.architecture,
        testing = testing,
        features = bullet_list(&req.requirements.features),
    )
}

/// (system, user) prompt pair for one generation request. Never fails.
pub fn compose(req: &GenerationRequest) -> (String, String) {
    (system_prompt(req.app_type), user_prompt(req))
}

/// System message prepended to every chat conversation.
pub fn assistant_system_prompt() -> &'static str {
r#"You are a helpful assistant for app development. Reply in the user's language (Arabic by default) and help with programming questions.

Important: if the user asks to create a Flutter or mobile app (e.g. "create an app", "build a program"), do not write the code or step-by-step instructions here. Instead, point them to the quick-action buttons below the chat or ask them to phrase a clear generation request such as "create an online shopping app", and the generator will produce the project automatically."#
}
