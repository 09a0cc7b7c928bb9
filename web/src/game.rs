use concentration_core::{
    Card, CardIndex, Dimensions, GameSession, MISMATCH_DELAY, SessionPhase, TICK_INTERVAL,
};
use gloo::events::EventListener;
use gloo::timers::callback::{Interval, Timeout};
use web_sys::HtmlSelectElement;
use yew::prelude::*;

use crate::storage::BrowserStorage;
use crate::utils::*;

#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) enum Msg {
    Flip(CardIndex),
    Tick,
    Conceal,
    NewGame,
    ChangeDifficulty(Dimensions),
    CrossTabMoves(u64),
}

#[derive(Properties, Clone, PartialEq)]
struct CardProps {
    card: Card,
    callback: Callback<CardIndex>,
}

#[function_component(CardView)]
fn card_component(props: &CardProps) -> Html {
    let CardProps { card, callback } = props.clone();

    let class = classes!(
        "card",
        card.is_revealed().then_some("flipped"),
        card.is_matched().then_some("matched"),
    );
    let symbol = card.visible_symbol().map(|symbol| symbol.to_string());
    let onclick = Callback::from(move |_: MouseEvent| {
        log::trace!("card {} clicked", card.index);
        callback.emit(card.index);
    });

    html! {
        <div {class} data-index={card.index.to_string()} data-symbol={symbol.clone()} {onclick}>
            {symbol.unwrap_or_default()}
        </div>
    }
}

#[derive(Properties, Debug, Clone, PartialEq)]
pub(crate) struct GameProps {
    /// Use this seed for every deal instead of a random one
    pub seed: Option<u64>,
    /// Board to switch to on load, replacing the stored one
    pub difficulty: Option<Dimensions>,
}

pub(crate) struct GameView {
    session: GameSession<BrowserStorage>,
    cross_tab_total: u64,
    timer_interval: Option<Interval>,
    conceal_timeout: Option<Timeout>,
    _cross_tab_listener: EventListener,
}

impl GameView {
    fn next_seed(ctx: &Context<Self>) -> u64 {
        ctx.props().seed.unwrap_or_else(js_random_seed)
    }

    /// Fresh clock for a new deal. A conceal left over from the old deal is dropped.
    fn reset_timers(&mut self, ctx: &Context<Self>) {
        self.conceal_timeout = None;
        self.timer_interval = (self.session.phase() == SessionPhase::Dealt).then(|| {
            let link = ctx.link().clone();
            Interval::new(TICK_INTERVAL.as_millis() as u32, move || {
                link.send_message(Msg::Tick)
            })
        });
    }

    fn schedule_conceal(&mut self, ctx: &Context<Self>) {
        let link = ctx.link().clone();
        self.conceal_timeout = Some(Timeout::new(MISMATCH_DELAY.as_millis() as u32, move || {
            link.send_message(Msg::Conceal)
        }));
    }

    fn flip(&mut self, ctx: &Context<Self>, index: CardIndex) -> bool {
        let transition = match self.session.flip(index, utc_now()) {
            Ok(transition) => transition,
            Err(err) => {
                log::debug!("flip of card {} ignored: {}", index, err);
                return false;
            }
        };

        if transition.outcome.completes_pair() {
            self.cross_tab_total = self.session.cross_tab_total();
        }
        if transition.outcome.needs_conceal() {
            self.schedule_conceal(ctx);
        }
        if transition.just_won() {
            self.timer_interval = None;
        }
        transition.has_update()
    }
}

impl Component for GameView {
    type Message = Msg;
    type Properties = GameProps;

    fn create(ctx: &Context<Self>) -> Self {
        let now = utc_now();
        let mut session = GameSession::new(BrowserStorage::new());
        session.start(Self::next_seed(ctx), now);
        if let Some(difficulty) = ctx
            .props()
            .difficulty
            .filter(|&difficulty| difficulty != session.difficulty())
        {
            session.change_difficulty(difficulty, Self::next_seed(ctx), now);
        }

        let cross_tab_listener = {
            let link = ctx.link().clone();
            session.observe_cross_tab_moves(move |total| link.send_message(Msg::CrossTabMoves(total)))
        };

        let mut view = Self {
            cross_tab_total: session.cross_tab_total(),
            session,
            timer_interval: None,
            conceal_timeout: None,
            _cross_tab_listener: cross_tab_listener,
        };
        view.reset_timers(ctx);
        view
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        use Msg::*;

        match msg {
            Flip(index) => self.flip(ctx, index),
            Tick => match self.session.tick(utc_now()) {
                Some(_) => true,
                None => {
                    self.timer_interval = None;
                    false
                }
            },
            Conceal => {
                self.conceal_timeout = None;
                self.session.conceal(utc_now()).has_update()
            }
            NewGame => {
                self.session.new_game(Self::next_seed(ctx), utc_now());
                self.reset_timers(ctx);
                true
            }
            ChangeDifficulty(difficulty) => {
                self.session
                    .change_difficulty(difficulty, Self::next_seed(ctx), utc_now());
                self.reset_timers(ctx);
                true
            }
            CrossTabMoves(total) => {
                log::debug!("total moves from another tab: {}", total);
                let updated = self.cross_tab_total != total;
                self.cross_tab_total = total;
                updated
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let Some(engine) = self.session.engine() else {
            return html! {};
        };

        let dimensions = engine.dimensions();
        let board_style = format!("grid-template-columns: repeat({}, 1fr)", dimensions.cols());
        let cb_new_game = ctx.link().callback(|_: MouseEvent| Msg::NewGame);
        let cb_difficulty = ctx.link().batch_callback(|e: Event| {
            let select = e.target_dyn_into::<HtmlSelectElement>()?;
            match select.value().parse::<Dimensions>() {
                Ok(difficulty) => Some(Msg::ChangeDifficulty(difficulty)),
                Err(err) => {
                    log::warn!("unknown difficulty {:?}: {}", select.value(), err);
                    None
                }
            }
        });
        let cb_flip = ctx.link().callback(Msg::Flip);

        html! {
            <div class="concentration">
                <nav>
                    <select onchange={cb_difficulty}>
                        {
                            for Dimensions::PRESETS.iter().map(|preset| {
                                let value = preset.to_string();
                                html! {
                                    <option value={value.clone()} selected={*preset == dimensions}>{value}</option>
                                }
                            })
                        }
                    </select>
                    <button onclick={cb_new_game}>{"New game"}</button>
                </nav>
                <aside>
                    <span>{format!("Moves: {}", engine.move_count())}</span>
                    <span>{format!("Time: {}", format_clock(engine.elapsed_secs()))}</span>
                    <span>{format!("Total moves (all tabs): {}", self.cross_tab_total)}</span>
                </aside>
                <div class="board" style={board_style}>
                    {
                        for engine.cards().map(|card| html! {
                            <CardView {card} callback={cb_flip.clone()}/>
                        })
                    }
                </div>
                if engine.is_finished() {
                    <p class="won">{"You won!"}</p>
                }
            </div>
        }
    }
}
