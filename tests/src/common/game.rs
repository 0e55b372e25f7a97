//! Turn-based two-player game used as the target of delegated calls

use ethers::{
    abi::{encode, AbiDecode, Token},
    contract::EthCall,
    types::{Address, Bytes, U256},
};
use warden_contracts::{CallContext, CallOutput, Contract, ContractError};
use warden_primitives::Event;

pub const CREATE_NEW_GAME: &str = "createNewGame(address,address)";
pub const MAKE_MOVE: &str = "makeMove(uint256,uint256)";

const CREATE_GAS: u64 = 45_000;
const MOVE_GAS: u64 = 25_000;
const VIEW_GAS: u64 = 2_600;

const LINES: [[usize; 3]; 8] =
    [[0, 1, 2], [3, 4, 5], [6, 7, 8], [0, 3, 6], [1, 4, 7], [2, 5, 8], [0, 4, 8], [2, 4, 6]];

#[derive(Clone, Debug, Default, PartialEq, Eq, EthCall)]
#[ethcall(name = "createNewGame", abi = "createNewGame(address,address)")]
pub struct CreateNewGameCall {
    pub player_1: Address,
    pub player_2: Address,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, EthCall)]
#[ethcall(name = "makeMove", abi = "makeMove(uint256,uint256)")]
pub struct MakeMoveCall {
    pub mv: U256,
    pub game_id: U256,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, EthCall)]
#[ethcall(name = "getCurrentBoard", abi = "getCurrentBoard(uint256)")]
pub struct GetCurrentBoardCall {
    pub game_id: U256,
}

/// State of a game
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameState {
    Ongoing = 0,
    Player1Won = 1,
    Player2Won = 2,
    Draw = 3,
}

/// Board as returned by `getCurrentBoard`: two bits per cell, then the turn bit, then the
/// game state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Board {
    cells: [u8; 9],
    player1_turn: bool,
    state: u8,
}

impl Board {
    pub fn encode(&self) -> U256 {
        let mut packed: u64 = 0;
        for (i, cell) in self.cells.iter().enumerate() {
            packed |= u64::from(*cell) << (2 * i);
        }
        packed |= u64::from(self.player1_turn) << 18;
        packed |= u64::from(self.state) << 19;
        packed.into()
    }

    pub fn decode(value: U256) -> Self {
        let packed = value.low_u64();
        let mut cells = [0u8; 9];
        for (i, cell) in cells.iter_mut().enumerate() {
            *cell = ((packed >> (2 * i)) & 0b11) as u8;
        }
        Self { cells, player1_turn: (packed >> 18) & 1 == 1, state: ((packed >> 19) & 0b11) as u8 }
    }

    pub fn player1_turn(&self) -> bool {
        self.player1_turn
    }

    pub fn state(&self) -> u8 {
        self.state
    }

    /// 0 for an empty cell, else the player number
    pub fn cell(&self, index: usize) -> u8 {
        self.cells.get(index).copied().unwrap_or_default()
    }
}

#[derive(Clone, Debug)]
struct Game {
    players: [Address; 2],
    board: Board,
}

#[derive(Clone, Debug, Default)]
pub struct TicTacToe {
    games: Vec<Game>,
}

impl TicTacToe {
    fn create_new_game(&mut self, ctx: &CallContext, call: CreateNewGameCall) -> CallOutput {
        let game_id = U256::from(self.games.len());
        self.games.push(Game {
            players: [call.player_1, call.player_2],
            board: Board { player1_turn: true, ..Default::default() },
        });
        CallOutput {
            return_data: encode(&[Token::Uint(game_id)]).into(),
            gas_used: CREATE_GAS,
            logs: vec![Event::Log {
                address: ctx.address,
                name: "GameCreated".into(),
                data: encode(&[
                    Token::Uint(game_id),
                    Token::Address(call.player_1),
                    Token::Address(call.player_2),
                ])
                .into(),
            }],
        }
    }

    fn make_move(
        &mut self,
        ctx: &CallContext,
        call: MakeMoveCall,
    ) -> Result<CallOutput, ContractError> {
        let game = self.game_mut(call.game_id)?;
        let board = &mut game.board;
        if board.state != GameState::Ongoing as u8 {
            return Err(ContractError::reverted("Game has ended"));
        }
        let (player, mark) =
            if board.player1_turn { (game.players[0], 1) } else { (game.players[1], 2) };
        if ctx.caller != player {
            return Err(ContractError::reverted("Not your turn"));
        }
        let cell = usize::try_from(call.mv.low_u64()).unwrap_or(usize::MAX);
        if call.mv > U256::from(8) || board.cells[cell] != 0 {
            return Err(ContractError::reverted("Invalid move"));
        }

        board.cells[cell] = mark;
        board.player1_turn = !board.player1_turn;

        let mut logs = vec![];
        if LINES.iter().any(|line| line.iter().all(|&i| board.cells[i] == mark)) {
            board.state = mark;
            logs.push(Event::Log {
                address: ctx.address,
                name: "PlayerWin".into(),
                data: encode(&[Token::Address(player), Token::Uint(call.game_id)]).into(),
            });
        } else if board.cells.iter().all(|c| *c != 0) {
            board.state = GameState::Draw as u8;
        }

        Ok(CallOutput { return_data: Bytes::default(), gas_used: MOVE_GAS, logs })
    }

    fn game_mut(&mut self, game_id: U256) -> Result<&mut Game, ContractError> {
        usize::try_from(game_id.low_u64())
            .ok()
            .filter(|_| game_id <= U256::from(u64::MAX))
            .and_then(|id| self.games.get_mut(id))
            .ok_or_else(|| ContractError::reverted("Game does not exist"))
    }
}

impl Contract for TicTacToe {
    fn call(&mut self, ctx: &CallContext, data: &[u8]) -> Result<CallOutput, ContractError> {
        if let Ok(call) = <CreateNewGameCall as AbiDecode>::decode(data) {
            return Ok(self.create_new_game(ctx, call));
        }
        if let Ok(call) = <MakeMoveCall as AbiDecode>::decode(data) {
            return self.make_move(ctx, call);
        }
        if let Ok(call) = <GetCurrentBoardCall as AbiDecode>::decode(data) {
            let board = self.game_mut(call.game_id)?.board;
            return Ok(CallOutput {
                return_data: encode(&[Token::Uint(board.encode())]).into(),
                gas_used: VIEW_GAS,
                logs: vec![],
            });
        }
        Err(ContractError::reverted("TicTacToe: unknown function"))
    }

    fn box_clone(&self) -> Box<dyn Contract> {
        Box::new(self.clone())
    }
}
